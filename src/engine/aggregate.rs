use std::collections::BTreeMap;

use chrono::{NaiveDate, Timelike};
use serde::Serialize;
use tracing::{info, instrument};

use super::{
    error::ValidationError,
    record::{ActivityRecord, Category, Source},
};

pub const HOURS_IN_DAY: usize = 24;

/// Every deduplicated and categorized record of one day plus groupings derived from them. It's
/// produced from scratch on every run and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyActivitySet {
    day: NaiveDate,
    activities: Vec<ActivityRecord>,
    by_category: BTreeMap<Category, Vec<ActivityRecord>>,
    by_source: BTreeMap<Source, usize>,
    hourly: [usize; HOURS_IN_DAY],
}

/// Records that started within one hour of the day.
#[derive(Debug, PartialEq)]
pub struct HourGroup<'a> {
    pub hour: u32,
    pub records: Vec<&'a ActivityRecord>,
}

impl DailyActivitySet {
    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// All records ordered by timestamp.
    pub fn activities(&self) -> &[ActivityRecord] {
        &self.activities
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn by_category(&self) -> &BTreeMap<Category, Vec<ActivityRecord>> {
        &self.by_category
    }

    pub fn category_count(&self, category: Category) -> usize {
        self.by_category.get(&category).map_or(0, Vec::len)
    }

    pub fn by_source(&self) -> &BTreeMap<Source, usize> {
        &self.by_source
    }

    pub fn source_count(&self, source: Source) -> usize {
        self.by_source.get(&source).copied().unwrap_or(0)
    }

    /// Number of records that started in each hour of the day. A record lasting several hours
    /// is counted once, in the hour it started, so the buckets always sum up to [Self::len].
    pub fn hourly(&self) -> &[usize; HOURS_IN_DAY] {
        &self.hourly
    }

    /// Non empty hours with their records, in order.
    pub fn timeline(&self) -> Vec<HourGroup<'_>> {
        let mut groups: Vec<HourGroup<'_>> = vec![];
        for record in &self.activities {
            let hour = record.timestamp().hour();
            match groups.last_mut() {
                Some(group) if group.hour == hour => group.records.push(record),
                _ => groups.push(HourGroup {
                    hour,
                    records: vec![record],
                }),
            }
        }
        groups
    }
}

/// Builds the [DailyActivitySet] for `day`.
///
/// Records are expected to be deduplicated and categorized already. A record without a category
/// or outside of `day` fails the whole aggregation.
#[instrument(skip(records), fields(count = records.len()))]
pub fn aggregate(
    day: NaiveDate,
    records: Vec<ActivityRecord>,
) -> Result<DailyActivitySet, ValidationError> {
    for (index, record) in records.iter().enumerate() {
        if record.category().is_none() {
            return Err(ValidationError::MissingCategory {
                index,
                title: record.title().into(),
                identity_key: record.identity_key().clone(),
                timestamp: record.timestamp(),
            });
        }
        if record.timestamp().date_naive() != day {
            return Err(ValidationError::OutOfDay {
                index,
                title: record.title().into(),
                identity_key: record.identity_key().clone(),
                timestamp: record.timestamp(),
                day,
            });
        }
    }

    let mut activities = records;
    // Stable, records with equal timestamps stay in collector order.
    activities.sort_by_key(|v| v.timestamp());

    let mut by_category = BTreeMap::<Category, Vec<ActivityRecord>>::new();
    let mut by_source = BTreeMap::<Source, usize>::new();
    let mut hourly = [0usize; HOURS_IN_DAY];

    for record in &activities {
        // Checked above.
        let category = record.category().unwrap_or(Category::Uncategorized);
        by_category.entry(category).or_default().push(record.clone());
        *by_source.entry(record.source()).or_default() += 1;
        hourly[record.timestamp().hour() as usize] += 1;
    }

    info!("Aggregated {} activities for {day}", activities.len());

    Ok(DailyActivitySet {
        day,
        activities,
        by_category,
        by_source,
        hourly,
    })
}
