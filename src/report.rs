use std::fmt::Write;

use crate::filter::TripView;
use crate::models::{weekday_name, Column, Dataset, Selector};
use crate::pager::Page;
use crate::stats::{Mode, StatGroup, Summary, Tally};

pub fn selector_label(selector: &Selector, name: impl Fn(u32) -> String) -> String {
    match selector {
        Selector::All => "all".to_string(),
        Selector::Values(values) => values
            .iter()
            .map(|value| name(*value))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// `123456.0` seconds renders as `1d 10:17:36`.
pub fn format_seconds(seconds: f64) -> String {
    let whole = seconds.max(0.0).round() as u64;
    let (days, rest) = (whole / 86_400, whole % 86_400);
    let (hours, minutes, secs) = (rest / 3600, rest % 3600 / 60, rest % 60);
    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    }
}

pub fn build_overview(dataset: &Dataset, view: &TripView<'_>, month: &str, day: &str) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {} bikeshare trips", dataset.city);
    let _ = writeln!(output, "Months: {month}; days: {day}");
    let _ = writeln!(
        output,
        "{} of {} trips match",
        view.len(),
        dataset.len()
    );
    if dataset.skipped > 0 {
        let _ = writeln!(
            output,
            "{} malformed records skipped",
            dataset.skipped
        );
    }
    let columns: Vec<&str> = dataset.columns.iter().map(|column| column.header()).collect();
    let _ = writeln!(output, "Columns: {}", columns.join(", "));
    if view.is_empty() {
        let _ = writeln!(output, "No trips match these filters.");
    }
    output
}

/// One page as a table: source row number, every original cell, then the
/// derived month and weekday.
pub fn render_page(view: &TripView<'_>, page: &Page<'_, '_>) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Page {}: rows {}-{} of {}",
        page.number + 1,
        page.start + 1,
        page.start + page.rows.len(),
        view.len()
    );
    let mut header: Vec<&str> = vec!["row"];
    header.extend(view.headers.iter().map(String::as_str));
    header.extend(["month", "day_of_week"]);
    let _ = writeln!(output, "{}", header.join(" | "));

    for record in page.rows {
        let mut cells = vec![record.row.to_string()];
        cells.extend(record.raw.iter().map(str::to_string));
        cells.resize(view.headers.len() + 1, String::new());
        cells.resize(view.headers.len(), String::new());
        cells.push(record.month.to_string());
        cells.push(weekday_name(record.day_of_week).to_string());
        let _ = writeln!(output, "{}", cells.join(" | "));
    }
    output
}

fn mode_line<T: std::fmt::Display>(output: &mut String, label: &str, found: &Option<Mode<T>>) {
    match found {
        Some(found) => {
            let _ = writeln!(output, "- {label}: {} (count {})", found.value, found.count);
        }
        None => {
            let _ = writeln!(output, "- {label}: no data available");
        }
    }
}

fn tally_lines(output: &mut String, label: &str, found: &Option<Vec<Tally>>) {
    match found {
        Some(tallies) if !tallies.is_empty() => {
            let _ = writeln!(output, "- {label}:");
            for tally in tallies {
                let _ = writeln!(output, "    {}: {}", tally.value, tally.count);
            }
        }
        Some(_) => {
            let _ = writeln!(output, "- {label}: no data available");
        }
        None => {}
    }
}

pub fn build_report(view: &TripView<'_>, summary: &Summary, groups: &[StatGroup]) -> String {
    let mut output = String::new();

    for group in groups {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", group.title());
        for column in group.missing(view.columns) {
            let _ = writeln!(output, "No data on {} for this city.", column.header());
        }

        match group {
            StatGroup::Time => {
                if let Some(time) = &summary.time {
                    mode_line(&mut output, "Most common month", &time.month);
                    mode_line(&mut output, "Most common day of week", &time.day_of_week);
                    mode_line(&mut output, "Most common start hour", &time.start_hour);
                }
            }
            StatGroup::Station => {
                if let Some(station) = &summary.station {
                    mode_line(&mut output, "Most common start station", &station.start_station);
                    mode_line(&mut output, "Most common end station", &station.end_station);
                    mode_line(&mut output, "Most common trip", &station.trip);
                }
            }
            StatGroup::Duration => match &summary.duration {
                Some(duration) => {
                    let _ = writeln!(
                        output,
                        "- Total travel time: {:.0}s ({})",
                        duration.total_seconds,
                        format_seconds(duration.total_seconds)
                    );
                    let _ = writeln!(
                        output,
                        "- Mean travel time: {:.1}s ({})",
                        duration.mean_seconds,
                        format_seconds(duration.mean_seconds)
                    );
                    let _ = writeln!(output, "- Trips with a duration: {}", duration.count);
                }
                None if summary.no_data.contains(group) => {
                    let _ = writeln!(output, "- Travel time: no data available");
                }
                None => {}
            },
            StatGroup::User => {
                if let Some(user) = &summary.user {
                    tally_lines(&mut output, "Trips by user type", &user.user_types);
                    tally_lines(&mut output, "Trips by gender", &user.genders);
                    if view.columns.has(Column::BirthYear) {
                        match &user.birth_year {
                            Some(years) => {
                                let _ = writeln!(output, "- Earliest birth year: {}", years.earliest);
                                let _ = writeln!(output, "- Most recent birth year: {}", years.latest);
                                let _ = writeln!(
                                    output,
                                    "- Most common birth year: {} (count {})",
                                    years.most_common.value, years.most_common.count
                                );
                            }
                            None => {
                                let _ = writeln!(output, "- Birth year: no data available");
                            }
                        }
                    }
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filter;
    use crate::loader::dataset_from_csv;
    use crate::models::month_name;
    use crate::pager::Paginator;
    use crate::stats::summarize;

    const TRIPS: &str = "\
,Start Time,Trip Duration,Start Station,End Station,User Type
7,2017-01-02 08:00:00,100,A,B,Subscriber
8,2017-01-03 09:00:00,200,A,B,Customer
";

    #[test]
    fn seconds_render_as_clock_time() {
        assert_eq!(format_seconds(59.6), "00:01:00");
        assert_eq!(format_seconds(3661.0), "01:01:01");
        assert_eq!(format_seconds(123456.0), "1d 10:17:36");
    }

    #[test]
    fn selector_labels() {
        let months = Selector::Values([1, 3].into_iter().collect());
        assert_eq!(
            selector_label(&months, |m| month_name(m).to_string()),
            "January, March"
        );
        assert_eq!(selector_label(&Selector::All, |m| m.to_string()), "all");
    }

    #[test]
    fn report_names_missing_columns() {
        let dataset = dataset_from_csv(TRIPS);
        let view = TripView::of(&dataset);
        let summary = summarize(&view, &StatGroup::ALL);
        let report = build_report(&view, &summary, &StatGroup::ALL);

        assert!(report.contains("Most common month: January (count 2)"));
        assert!(report.contains("Most common trip: A -> B (count 2)"));
        assert!(report.contains("Total travel time: 300s (00:05:00)"));
        assert!(report.contains("No data on gender for this city."));
        assert!(report.contains("No data on birth year for this city."));
        assert!(!report.contains("Birth year: no data"));
    }

    #[test]
    fn empty_view_reports_no_data() {
        let dataset = dataset_from_csv(TRIPS);
        let view = filter(
            &dataset,
            &Selector::Values([4].into_iter().collect()),
            &Selector::All,
        );
        let summary = summarize(&view, &StatGroup::ALL);
        let report = build_report(&view, &summary, &StatGroup::ALL);

        assert!(report.contains("Most common month: no data available"));
        assert!(report.contains("Travel time: no data available"));
        assert!(report.contains("Trips by user type: no data available"));
    }

    #[test]
    fn pages_show_raw_and_derived_fields() {
        let dataset = dataset_from_csv(TRIPS);
        let view = TripView::of(&dataset);
        let mut pager = Paginator::new(&view, 1);
        pager.advance(|_| true).unwrap();
        let page = pager.advance(|_| true).unwrap();
        let rendered = render_page(&view, &page);
        let mut lines = rendered.lines();
        assert_eq!(lines.next(), Some("Page 2: rows 2-2 of 2"));
        assert_eq!(
            lines.next(),
            Some("row |  | Start Time | Trip Duration | Start Station | End Station | User Type | month | day_of_week")
        );
        assert_eq!(
            lines.next(),
            Some("1 | 8 | 2017-01-03 09:00:00 | 200 | A | B | Customer | 1 | Tuesday")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn overview_counts_matches() {
        let dataset = dataset_from_csv(TRIPS);
        let view = filter(
            &dataset,
            &Selector::All,
            &Selector::Values([2].into_iter().collect()),
        );
        let overview = build_overview(&dataset, &view, "all", "Tuesday");
        assert!(overview.contains("1 of 2 trips match"));
        assert!(overview.contains("Columns: start time, trip duration"));
        assert!(!overview.contains("No trips match"));

        let none = filter(
            &dataset,
            &Selector::Values([6].into_iter().collect()),
            &Selector::All,
        );
        let overview = build_overview(&dataset, &none, "June", "all");
        assert!(overview.contains("0 of 2 trips match"));
        assert!(overview.contains("No trips match these filters."));
    }
}
