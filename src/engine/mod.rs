//! The aggregation and categorization engine.
//!
//! Records from every collector pass through the same stages:
//!  - [dedupe::dedupe] collapses repeated events of one source.
//!  - [categorize::categorize_all] assigns categories using a validated rule set.
//!  - [aggregate::aggregate] orders the day and derives groupings.
//!  - [statistics::compute] summarizes the result.
//!
//! The engine is synchronous and performs no I/O. Running it twice on the same records yields the
//! same [DailyReport].

pub mod aggregate;
pub mod categorize;
pub mod dedupe;
pub mod error;
pub mod record;
pub mod statistics;

use aggregate::{aggregate, DailyActivitySet};
use categorize::{categorize_all, CategoryRuleSet};
use chrono::NaiveDate;
use dedupe::{dedupe, MergeWindow};
use error::ValidationError;
use record::ActivityRecord;
use serde::Serialize;
use statistics::{compute, StatisticsSnapshot};
use tracing::instrument;

/// Everything the engine needs besides the records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    pub rules: CategoryRuleSet,
    pub merge_window: MergeWindow,
}

/// Result of one run, handed over to whatever renders the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    pub activities: DailyActivitySet,
    pub statistics: StatisticsSnapshot,
}

#[instrument(skip(records, config), fields(count = records.len()))]
pub fn run_pipeline(
    day: NaiveDate,
    records: Vec<ActivityRecord>,
    config: &EngineConfig,
) -> Result<DailyReport, ValidationError> {
    let unique = dedupe(records, config.merge_window);
    let categorized = categorize_all(unique, &config.rules);
    let activities = aggregate(day, categorized)?;
    let statistics = compute(&activities);
    Ok(DailyReport {
        activities,
        statistics,
    })
}
