use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use ansi_term::{Colour, Style};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use serde::Serialize;
use tracing::info;

use crate::{
    collection::{collect_day, directory::RecordDirectory},
    engine::{run_pipeline, DailyReport},
    utils::clock::{Clock, DefaultClock},
};

use super::{load_settings, Args};

/// Titles shown per hour in the timeline before the rest is collapsed.
const TITLES_PER_HOUR: usize = 3;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(
        long,
        short,
        help = "Day of the report. Examples are \"today\", \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long,
        help = "Settings file. By default uses settings.json in the application directory"
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        help = "Directory collectors write into. By default the records folder in the application directory"
    )]
    records: Option<PathBuf>,
    #[arg(
        short,
        long,
        help = "Additional record files to include. Can be repeated"
    )]
    input: Vec<PathBuf>,
    #[arg(long, help = "Print the report as JSON instead of a summary")]
    json: bool,
}

/// Command to process `report` command. Loads the records of one day, runs them through the
/// engine and prints the result.
pub async fn process_report_command(
    ReportCommand {
        date,
        date_style,
        config,
        records,
        input,
        json,
    }: ReportCommand,
    app_dir: &Path,
) -> Result<()> {
    let day = resolve_day(date, date_style, &DefaultClock)?;
    let settings = load_settings(config, app_dir)?;

    let directory = RecordDirectory::new(records.unwrap_or_else(|| app_dir.join("records")))
        .context("Failed to open record directory")?;
    let mut files = directory.files_for(day).await?;
    files.extend(input);

    let records = collect_day(files, day, &settings.privacy).await?;
    let report = run_pipeline(day, records, &settings.engine)?;
    info!(
        "Report for {day} built from {} activities",
        report.statistics.total
    );

    if json {
        println!("{}", render_json(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

/// Resolves the requested day against the current time of `clock`.
fn resolve_day(
    date: Option<String>,
    date_style: DateStyle,
    clock: &dyn Clock,
) -> Result<NaiveDate> {
    let now = clock.now();
    match date.map(|s| parse_date_string(&s, now, date_style.into())) {
        Some(Ok(v)) => Ok(v.with_timezone(&Local).date_naive()),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {e}"),
            )
            .into()),
        None => Ok(now.date_naive()),
    }
}

#[derive(Serialize)]
struct ReportExport<'a> {
    day: NaiveDate,
    #[serde(flatten)]
    report: &'a DailyReport,
}

fn render_json(report: &DailyReport) -> Result<String> {
    let export = ReportExport {
        day: report.activities.day(),
        report,
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

fn print_summary(report: &DailyReport) {
    let statistics = &report.statistics;
    let heading = Style::new().bold();

    println!(
        "{}",
        Colour::Green
            .bold()
            .paint(format!("Daily report for {}", report.activities.day()))
    );
    println!();
    println!("{} {}", heading.paint("Activities:"), statistics.total);
    println!("{} {}", heading.paint("Productivity:"), statistics.productivity);
    if let (Some(first), Some(last)) = (statistics.first_activity, statistics.last_activity) {
        println!(
            "{} {} - {} ({})",
            heading.paint("Active:"),
            first.format("%H:%M"),
            last.format("%H:%M"),
            format_hours(statistics.active_span_hours)
        );
    }
    if let Some(hour) = statistics.peak_hour {
        println!("{} {hour:02}:00", heading.paint("Peak hour:"));
    }

    if !statistics.by_category.is_empty() {
        println!();
        println!("{}", heading.paint("Categories"));
        for (category, count) in &statistics.by_category {
            let colour = if category.is_productive() {
                Colour::Green
            } else {
                Colour::Yellow
            };
            println!("  {}\t{count}", colour.paint(category.to_string()));
        }
    }

    if !statistics.by_source.is_empty() {
        println!();
        println!("{}", heading.paint("Sources"));
        for (source, count) in &statistics.by_source {
            println!("  {source}\t{count}");
        }
    }

    let timeline = report.activities.timeline();
    if !timeline.is_empty() {
        println!();
        println!("{}", heading.paint("Timeline"));
        for group in timeline {
            let mut titles = group
                .records
                .iter()
                .take(TITLES_PER_HOUR)
                .map(|v| v.title())
                .collect::<Vec<_>>()
                .join(", ");
            if group.records.len() > TITLES_PER_HOUR {
                titles.push_str(&format!(" (+{})", group.records.len() - TITLES_PER_HOUR));
            }
            println!(
                "  {}\t{}\t{titles}",
                Colour::Blue.paint(format!("{:02}:00", group.hour)),
                group.records.len()
            );
        }
    }

    if !statistics.insights.is_empty() {
        println!();
        println!("{}", heading.paint("Insights"));
        for insight in &statistics.insights {
            println!("  - {insight}");
        }
    }
}

fn format_hours(hours: f64) -> String {
    let minutes = (hours * 60.).round() as i64;
    if minutes >= 60 {
        format!("{}h{}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}
