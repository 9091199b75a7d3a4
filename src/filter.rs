use chrono::Weekday;
use tracing::debug;

use crate::models::{weekday_from_code, ColumnSet, Dataset, Selector, TripRecord};

/// An ordered subset of a dataset's records. Borrows from the dataset, so the
/// source stays untouched.
#[derive(Debug, Clone)]
pub struct TripView<'a> {
    pub headers: &'a [String],
    pub columns: &'a ColumnSet,
    pub rows: Vec<&'a TripRecord>,
}

impl<'a> TripView<'a> {
    pub fn of(dataset: &'a Dataset) -> Self {
        TripView {
            headers: &dataset.headers,
            columns: &dataset.columns,
            rows: dataset.records.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Source row positions, in view order.
    #[cfg(test)]
    pub fn row_ids(&self) -> Vec<usize> {
        self.rows.iter().map(|record| record.row).collect()
    }
}

fn selected_weekdays(day: &Selector) -> Option<Vec<Weekday>> {
    match day {
        Selector::All => None,
        Selector::Values(values) => Some(
            values
                .iter()
                .filter_map(|value| weekday_from_code(*value))
                .collect(),
        ),
    }
}

pub fn refine<'a>(view: &TripView<'a>, month: &Selector, day: &Selector) -> TripView<'a> {
    let weekdays = selected_weekdays(day);
    let rows: Vec<&'a TripRecord> = view
        .rows
        .iter()
        .copied()
        .filter(|record| month.admits(record.month))
        .filter(|record| {
            weekdays
                .as_ref()
                .is_none_or(|days| days.contains(&record.day_of_week))
        })
        .collect();

    debug!(before = view.len(), after = rows.len(), "applied month/day filter");

    TripView {
        headers: view.headers,
        columns: view.columns,
        rows,
    }
}

pub fn filter<'a>(dataset: &'a Dataset, month: &Selector, day: &Selector) -> TripView<'a> {
    refine(&TripView::of(dataset), month, day)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fmt::Write;

    use super::*;
    use crate::loader::dataset_from_csv;

    fn values(items: &[u32]) -> Selector {
        Selector::Values(items.iter().copied().collect::<BTreeSet<_>>())
    }

    /// 100 trips, one per day from 2017-01-01 (a Sunday) with the hour
    /// cycling through the day.
    fn hundred_trips() -> String {
        let mut csv = String::from("Start Time,Trip Duration\n");
        let start = chrono::NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        for offset in 0..100 {
            let date = start + chrono::Duration::days(offset);
            let _ = writeln!(csv, "{} {:02}:15:00,{}", date, offset % 24, offset * 10);
        }
        csv
    }

    #[test]
    fn sentinel_selectors_return_everything_in_order() {
        let dataset = dataset_from_csv(&hundred_trips());
        let view = filter(&dataset, &Selector::All, &Selector::All);
        assert_eq!(view.len(), dataset.len());
        assert_eq!(view.row_ids(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn january_mondays() {
        // Mondays in January 2017: 2, 9, 16, 23, 30. Only 5 of the 100.
        let dataset = dataset_from_csv(&hundred_trips());
        let view = filter(&dataset, &values(&[1]), &values(&[1]));
        assert_eq!(view.row_ids(), vec![1, 8, 15, 22, 29]);
        assert_eq!(dataset.len(), 100);
    }

    #[test]
    fn seven_matching_trips_out_of_a_hundred() {
        let mut csv = String::from("Start Time\n");
        for i in 0..100 {
            let day = match i {
                0..=6 => "2017-01-02",
                _ if i % 2 == 0 => "2017-01-03",
                _ => "2017-02-06",
            };
            let _ = writeln!(csv, "{day} {:02}:00:00", i % 24);
        }
        let dataset = dataset_from_csv(&csv);

        let view = filter(&dataset, &values(&[1]), &values(&[1]));
        assert_eq!(view.len(), 7);
        assert_eq!(view.row_ids(), (0..7).collect::<Vec<_>>());
        assert_eq!(dataset.len(), 100);
    }

    #[test]
    fn several_months_and_days() {
        let dataset = dataset_from_csv(&hundred_trips());
        // Mondays: Feb 6, 13, 20, 27 and Mar 6, 13, 20, 27.
        let view = filter(&dataset, &values(&[2, 3]), &values(&[1]));
        assert_eq!(view.len(), 8);

        // Jan: 5 Mondays + 5 Sundays, Feb: 4 Mondays + 4 Sundays.
        let view = filter(&dataset, &values(&[1, 2]), &values(&[1, 7]));
        assert_eq!(view.len(), 18);
    }

    #[test]
    fn month_and_day_filters_are_conjunctive() {
        let dataset = dataset_from_csv(&hundred_trips());
        let by_month = filter(&dataset, &values(&[2]), &Selector::All);
        assert_eq!(by_month.len(), 28);
        let by_day = filter(&dataset, &Selector::All, &values(&[3]));
        assert_eq!(by_day.len(), 14);
        let both = filter(&dataset, &values(&[2]), &values(&[3]));
        assert_eq!(both.len(), 4);
        assert!(both
            .rows
            .iter()
            .all(|record| record.month == 2 && record.day_of_week == Weekday::Wed));
    }

    #[test]
    fn filtering_is_idempotent() {
        let dataset = dataset_from_csv(&hundred_trips());
        let month = values(&[1, 3]);
        let day = values(&[2, 6]);
        let once = filter(&dataset, &month, &day);
        let twice = refine(&once, &month, &day);
        assert_eq!(once.row_ids(), twice.row_ids());
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let dataset = dataset_from_csv(&hundred_trips());
        let view = filter(&dataset, &values(&[6]), &Selector::All);
        assert!(view.is_empty());
    }
}
