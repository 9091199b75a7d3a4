use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod filter;
mod loader;
mod models;
mod pager;
mod report;
mod selector;
mod stats;

use crate::filter::TripView;
use crate::models::{month_name, weekday_from_code, weekday_name, City, Dataset, Selector};
use crate::pager::{Paginator, DEFAULT_PAGE_SIZE};
use crate::selector::{SelectorSpec, Validated};
use crate::stats::{StatGroup, Summary};

#[derive(Parser)]
#[command(name = "bikeshare")]
#[command(about = "Explore US bikeshare trip data by month and day of week", long_about = None)]
struct Cli {
    /// chicago, new york city or washington
    #[arg(value_parser = City::from_str)]
    city: City,
    /// Directory holding the city CSV files
    #[arg(long, env = "BIKESHARE_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,
    /// Log at debug level (otherwise BIKESHARE_LOG, default warn)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter trips by month and day of week, then show statistics
    Filter {
        /// 0 for all months, 1 for January and so on up to 6 (June)
        #[arg(short, long)]
        month: Option<String>,
        /// 0 for all days, 1 for Monday and so on up to 7 (Sunday)
        #[arg(short, long)]
        day: Option<String>,
        /// Page through the matching rows before the statistics
        #[arg(short, long, conflicts_with = "json")]
        show: bool,
        /// Rows per page
        #[arg(
            short,
            long,
            env = "BIKESHARE_PAGE_SIZE",
            default_value_t = DEFAULT_PAGE_SIZE,
            value_parser = parse_page_size
        )]
        lines: usize,
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
        /// Run a single cycle without offering a restart
        #[arg(long)]
        once: bool,
    },
    /// Statistics over every trip of the city
    Summary {
        #[arg(long)]
        time: bool,
        #[arg(long)]
        station: bool,
        #[arg(long)]
        trip: bool,
        #[arg(long)]
        user: bool,
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_page_size(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err("page size must be at least 1".to_string()),
        Ok(size) => Ok(size),
        Err(err) => Err(err.to_string()),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("BIKESHARE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn month_label(selector: &Selector) -> String {
    report::selector_label(selector, |month| month_name(month).to_string())
}

fn day_label(selector: &Selector) -> String {
    report::selector_label(selector, |code| {
        weekday_from_code(code)
            .map(weekday_name)
            .unwrap_or("Unknown")
            .to_string()
    })
}

fn write_selection<W: Write>(
    out: &mut W,
    validated: &Validated,
    spec: &SelectorSpec,
) -> io::Result<()> {
    if validated.selector == Selector::All {
        writeln!(out, "Using all values for {}.", spec.kind)?;
    } else {
        writeln!(out, "Using {}: {}", spec.kind, validated.accepted.join(", "))?;
    }
    if !validated.rejected.is_empty() {
        writeln!(
            out,
            "Ignored invalid {} value(s): {}",
            spec.kind,
            validated.rejected.join(", ")
        )?;
    }
    if !validated.ignored.is_empty() {
        writeln!(
            out,
            "{} selects every {}; ignored: {}",
            spec.sentinel,
            spec.kind,
            validated.ignored.join(", ")
        )?;
    }
    Ok(())
}

/// Validates a flag value, or prompts until the user enters a valid one.
fn select(raw: Option<String>, spec: &SelectorSpec) -> anyhow::Result<Validated> {
    let raw = match raw {
        Some(raw) => raw,
        None => Input::<String>::new()
            .with_prompt(format!("Which {} ({})?", spec.kind, spec.expected()))
            .validate_with(|input: &String| {
                selector::parse_bounded_selector(input, spec)
                    .map(|_| ())
                    .map_err(|err| err.to_string())
            })
            .interact_text()?,
    };
    Ok(selector::parse_bounded_selector(&raw, spec)?)
}

fn confirm(prompt: String, default: bool) -> bool {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .unwrap_or_else(|err| {
            warn!(%err, "confirmation prompt failed");
            false
        })
}

fn write_rows<W: Write>(out: &mut W, view: &TripView<'_>, page_size: usize) -> io::Result<()> {
    let pager = Paginator::new(view, page_size);
    let size = pager.page_size();
    let pages = pager.pages(|_| confirm(format!("Show the next {size} rows?"), true));
    for page in pages {
        write!(out, "{}", report::render_page(view, &page))?;
    }
    Ok(())
}

fn write_summary<W: Write>(
    out: &mut W,
    view: &TripView<'_>,
    summary: &Summary,
    groups: &[StatGroup],
    json: bool,
) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, summary).context("failed to encode statistics")?;
        writeln!(out)?;
    } else {
        write!(out, "{}", report::build_report(view, summary, groups))?;
    }
    Ok(())
}

/// One filter-view cycle. With `json`, stdout carries only the summary
/// document and the selection notes go to stderr.
fn write_cycle<W: Write>(
    out: &mut W,
    dataset: &Dataset,
    month: &Validated,
    day: &Validated,
    page_size: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let mut err = io::stderr();
        write_selection(&mut err, month, &selector::MONTHS)?;
        write_selection(&mut err, day, &selector::DAYS)?;
    } else {
        write_selection(out, month, &selector::MONTHS)?;
        write_selection(out, day, &selector::DAYS)?;
    }

    let view = filter::filter(dataset, &month.selector, &day.selector);
    info!(rows = view.len(), "filter applied");

    if !json {
        let overview = report::build_overview(
            dataset,
            &view,
            &month_label(&month.selector),
            &day_label(&day.selector),
        );
        write!(out, "{overview}")?;
    }
    if let Some(size) = page_size {
        write_rows(out, &view, size)?;
    }

    let summary = stats::summarize(&view, &StatGroup::ALL);
    write_summary(out, &view, &summary, &StatGroup::ALL, json)
}

struct FilterArgs {
    month: Option<String>,
    day: Option<String>,
    show: bool,
    lines: usize,
    json: bool,
    once: bool,
}

fn run_filter(dataset: &Dataset, args: FilterArgs) -> anyhow::Result<()> {
    let FilterArgs {
        mut month,
        mut day,
        show,
        lines,
        json,
        once,
    } = args;
    let mut out = io::stdout();

    loop {
        let month_selection = select(month.take(), &selector::MONTHS)?;
        let day_selection = select(day.take(), &selector::DAYS)?;
        let page_size = show.then_some(lines);
        write_cycle(
            &mut out,
            dataset,
            &month_selection,
            &day_selection,
            page_size,
            json,
        )?;
        out.flush()?;

        let restart = format!(
            "Restart to select different month(s) or day(s) for {}?",
            dataset.city
        );
        if once || !confirm(restart, false) {
            break;
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let dataset = loader::load(cli.city, &cli.data_dir)
        .with_context(|| format!("failed to load trip data for {}", cli.city))?;
    if dataset.is_empty() {
        warn!(city = %dataset.city, "no trips loaded");
    }

    match cli.command {
        Commands::Filter {
            month,
            day,
            show,
            lines,
            json,
            once,
        } => {
            if !json {
                println!("Hello! Let's explore some US bikeshare data for {}!", dataset.city);
            }
            run_filter(
                &dataset,
                FilterArgs {
                    month,
                    day,
                    show,
                    lines,
                    json,
                    once,
                },
            )?;
        }
        Commands::Summary {
            time,
            station,
            trip,
            user,
            json,
        } => {
            let chosen: Vec<StatGroup> = [
                (time, StatGroup::Time),
                (station, StatGroup::Station),
                (trip, StatGroup::Duration),
                (user, StatGroup::User),
            ]
            .into_iter()
            .filter_map(|(wanted, group)| wanted.then_some(group))
            .collect();
            let groups = if chosen.is_empty() {
                StatGroup::ALL.to_vec()
            } else {
                chosen
            };

            let view = TripView::of(&dataset);
            let mut out = io::stdout();
            if !json {
                write!(out, "{}", report::build_overview(&dataset, &view, "all", "all"))?;
            }
            let summary = stats::summarize(&view, &groups);
            write_summary(&mut out, &view, &summary, &groups, json)?;
        }
    }

    Ok(())
}
