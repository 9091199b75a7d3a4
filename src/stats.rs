//! Statistic groups over a filtered view.
//!
//! Each field is computed only when the view's dataset carries the columns it
//! reads; missing columns leave the field `None`.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::Timelike;
use serde::Serialize;
use tracing::debug;

use crate::error::{ExploreError, ExploreResult};
use crate::filter::TripView;
use crate::models::{month_name, weekday_name, Column, ColumnSet};

pub const PAIR_SEPARATOR: &str = " -> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatGroup {
    Time,
    Station,
    Duration,
    User,
}

impl StatGroup {
    pub const ALL: [StatGroup; 4] = [
        StatGroup::Time,
        StatGroup::Station,
        StatGroup::Duration,
        StatGroup::User,
    ];

    /// Source columns the group reads from. A group runs if any is present.
    pub fn columns(&self) -> &'static [Column] {
        match self {
            StatGroup::Time => &[Column::StartTime],
            StatGroup::Station => &[Column::StartStation, Column::EndStation],
            StatGroup::Duration => &[Column::TripDuration],
            StatGroup::User => &[Column::UserType, Column::Gender, Column::BirthYear],
        }
    }

    pub fn is_available(&self, columns: &ColumnSet) -> bool {
        self.columns().iter().any(|column| columns.has(*column))
    }

    pub fn missing(&self, columns: &ColumnSet) -> Vec<Column> {
        self.columns()
            .iter()
            .copied()
            .filter(|column| !columns.has(*column))
            .collect()
    }

    pub fn title(&self) -> &'static str {
        match self {
            StatGroup::Time => "Most Frequent Times of Travel",
            StatGroup::Station => "Most Popular Stations and Trip",
            StatGroup::Duration => "Trip Duration",
            StatGroup::User => "User Stats",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mode<T> {
    pub value: T,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStats {
    pub month: Option<Mode<String>>,
    pub day_of_week: Option<Mode<String>>,
    pub start_hour: Option<Mode<u32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    pub start_station: Option<Mode<String>>,
    pub end_station: Option<Mode<String>>,
    pub trip: Option<Mode<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub count: usize,
    pub total_seconds: f64,
    pub mean_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub latest: i32,
    pub most_common: Mode<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_types: Option<Vec<Tally>>,
    pub genders: Option<Vec<Tally>>,
    pub birth_year: Option<BirthYearStats>,
}

/// All requested groups for one view. A `None` group was not requested or
/// has no source columns, unless it is listed in `no_data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub time: Option<TimeStats>,
    pub station: Option<StationStats>,
    pub duration: Option<DurationStats>,
    pub user: Option<UserStats>,
    /// Groups whose columns exist but hold no values in this view.
    pub no_data: Vec<StatGroup>,
}

/// Most frequent value; ties go to the value seen first.
pub fn mode<T, I>(values: I) -> Option<Mode<T>>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    tallies(values).into_iter().next().map(|(value, count)| Mode { value, count })
}

/// Occurrence counts, highest first, ties in order of first appearance.
fn tallies<T, I>(values: I) -> Vec<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, (usize, usize)> = HashMap::new();
    for (position, value) in values.into_iter().enumerate() {
        counts.entry(value).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(T, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (a_count, a_first)), (_, (b_count, b_first))| {
        b_count.cmp(a_count).then(a_first.cmp(b_first))
    });
    ranked
        .into_iter()
        .map(|(value, (count, _))| (value, count))
        .collect()
}

fn counts<'v, I>(values: I) -> Vec<Tally>
where
    I: IntoIterator<Item = &'v str>,
{
    tallies(values)
        .into_iter()
        .map(|(value, count)| Tally {
            value: value.to_string(),
            count,
        })
        .collect()
}

pub fn time_stats(view: &TripView<'_>) -> TimeStats {
    let month = mode(view.rows.iter().map(|record| record.month)).map(|found| Mode {
        value: month_name(found.value).to_string(),
        count: found.count,
    });
    let day_of_week = mode(view.rows.iter().map(|record| record.day_of_week)).map(|found| Mode {
        value: weekday_name(found.value).to_string(),
        count: found.count,
    });
    let start_hour = if view.columns.has(Column::StartTime) {
        mode(view.rows.iter().map(|record| record.start_time.hour()))
    } else {
        None
    };

    TimeStats {
        month,
        day_of_week,
        start_hour,
    }
}

pub fn station_stats(view: &TripView<'_>) -> StationStats {
    let columns = view.columns;
    let start_station = columns
        .has(Column::StartStation)
        .then(|| mode(view.rows.iter().filter_map(|r| r.start_station.as_deref())))
        .flatten();
    let end_station = columns
        .has(Column::EndStation)
        .then(|| mode(view.rows.iter().filter_map(|r| r.end_station.as_deref())))
        .flatten();
    let trip = columns
        .has_all(&[Column::StartStation, Column::EndStation])
        .then(|| {
            mode(view.rows.iter().filter_map(|r| {
                match (r.start_station.as_deref(), r.end_station.as_deref()) {
                    (Some(start), Some(end)) => Some(format!("{start}{PAIR_SEPARATOR}{end}")),
                    _ => None,
                }
            }))
        })
        .flatten();

    StationStats {
        start_station: start_station.map(owned),
        end_station: end_station.map(owned),
        trip,
    }
}

fn owned(found: Mode<&str>) -> Mode<String> {
    Mode {
        value: found.value.to_string(),
        count: found.count,
    }
}

/// Sum and mean of the valid trip durations. Fails with
/// `EmptyAggregationInput` when the column holds no values in this view.
pub fn trip_duration_stats(view: &TripView<'_>) -> ExploreResult<Option<DurationStats>> {
    if !view.columns.has(Column::TripDuration) {
        return Ok(None);
    }

    let durations: Vec<f64> = view
        .rows
        .iter()
        .filter_map(|record| record.trip_duration)
        .collect();
    if durations.is_empty() {
        return Err(ExploreError::EmptyAggregationInput(
            Column::TripDuration.header(),
        ));
    }

    let total_seconds: f64 = durations.iter().sum();
    Ok(Some(DurationStats {
        count: durations.len(),
        total_seconds,
        mean_seconds: total_seconds / durations.len() as f64,
    }))
}

pub fn user_stats(view: &TripView<'_>) -> UserStats {
    let columns = view.columns;
    let user_types = columns
        .has(Column::UserType)
        .then(|| counts(view.rows.iter().filter_map(|r| r.user_type.as_deref())));
    let genders = columns
        .has(Column::Gender)
        .then(|| counts(view.rows.iter().filter_map(|r| r.gender.as_deref())));
    let birth_year = columns
        .has(Column::BirthYear)
        .then(|| {
            let years: Vec<i32> = view.rows.iter().filter_map(|r| r.birth_year).collect();
            let earliest = years.iter().copied().min()?;
            let latest = years.iter().copied().max()?;
            let most_common = mode(years)?;
            Some(BirthYearStats {
                earliest,
                latest,
                most_common,
            })
        })
        .flatten();

    UserStats {
        user_types,
        genders,
        birth_year,
    }
}

pub fn summarize(view: &TripView<'_>, groups: &[StatGroup]) -> Summary {
    let mut summary = Summary {
        rows: view.len(),
        ..Summary::default()
    };

    for group in groups {
        if !group.is_available(view.columns) {
            debug!(?group, "no source columns, skipping");
            continue;
        }
        match group {
            StatGroup::Time => summary.time = Some(time_stats(view)),
            StatGroup::Station => summary.station = Some(station_stats(view)),
            StatGroup::Duration => match trip_duration_stats(view) {
                Ok(stats) => summary.duration = stats,
                Err(err) => {
                    debug!(%err, "trip duration skipped");
                    summary.no_data.push(StatGroup::Duration);
                }
            },
            StatGroup::User => summary.user = Some(user_stats(view)),
        }
    }

    summary
}
