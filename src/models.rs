use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, Weekday};
use csv::StringRecord;

use crate::error::ExploreError;

/// Canonical weekday ordering; selector value `i` maps to `WEEKDAYS[i - 1]`.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Day selector code (1 = Monday) to weekday.
pub fn weekday_from_code(code: u32) -> Option<Weekday> {
    let idx = code.checked_sub(1)?;
    WEEKDAYS.get(idx as usize).copied()
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
        .unwrap_or("Unknown")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum City {
    Chicago,
    NewYorkCity,
    Washington,
}

impl City {
    pub fn file_name(&self) -> &'static str {
        match self {
            City::Chicago => "chicago.csv",
            City::NewYorkCity => "new_york_city.csv",
            City::Washington => "washington.csv",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            City::Chicago => "Chicago",
            City::NewYorkCity => "New York City",
            City::Washington => "Washington",
        };
        f.write_str(label)
    }
}

impl FromStr for City {
    type Err = ExploreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "chicago" => Ok(City::Chicago),
            "new york" | "new york city" | "nyc" => Ok(City::NewYorkCity),
            "washington" => Ok(City::Washington),
            _ => Err(ExploreError::UnknownCity(raw.to_string())),
        }
    }
}

/// Source columns the engine understands. Anything else in a file is carried
/// through for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    StartTime,
    EndTime,
    TripDuration,
    StartStation,
    EndStation,
    UserType,
    Gender,
    BirthYear,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::StartTime,
        Column::EndTime,
        Column::TripDuration,
        Column::StartStation,
        Column::EndStation,
        Column::UserType,
        Column::Gender,
        Column::BirthYear,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Column::StartTime => "start time",
            Column::EndTime => "end time",
            Column::TripDuration => "trip duration",
            Column::StartStation => "start station",
            Column::EndStation => "end station",
            Column::UserType => "user type",
            Column::Gender => "gender",
            Column::BirthYear => "birth year",
        }
    }

    /// Case-insensitive, whitespace-trimmed header lookup.
    pub fn from_header(header: &str) -> Option<Self> {
        let normalized = header.trim().to_lowercase();
        Column::ALL
            .into_iter()
            .find(|column| column.header() == normalized)
    }
}

/// Columns present in a loaded dataset, fixed at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet(BTreeSet<Column>);

impl ColumnSet {
    pub fn has(&self, column: Column) -> bool {
        self.0.contains(&column)
    }

    pub fn has_all(&self, columns: &[Column]) -> bool {
        columns.iter().all(|column| self.has(*column))
    }

    pub fn iter(&self) -> impl Iterator<Item = Column> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Column> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        ColumnSet(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone)]
pub struct TripRecord {
    /// Zero-based position in the source file, excluding the header.
    pub row: usize,
    pub start_time: NaiveDateTime,
    pub trip_duration: Option<f64>,
    pub start_station: Option<String>,
    pub end_station: Option<String>,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    pub month: u32,
    pub day_of_week: Weekday,
    pub raw: StringRecord,
}

/// A city's trips. Never mutated after loading; filters produce views.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub city: City,
    pub headers: Vec<String>,
    pub columns: ColumnSet,
    pub records: Vec<TripRecord>,
    pub skipped: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Normalized filter values for one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    All,
    Values(BTreeSet<u32>),
}

impl Selector {
    pub fn admits(&self, value: u32) -> bool {
        match self {
            Selector::All => true,
            Selector::Values(values) => values.contains(&value),
        }
    }
}
