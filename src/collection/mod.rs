//! Hand over point between collectors and the engine.
//!
//! Collectors run independently and leave their output as JSON lines in a [RecordDirectory].
//! This module reads those files concurrently, applies privacy exclusions, normalizes every
//! activity and drops the ones that don't belong to the requested day. Whatever comes out of
//! [collect_day] satisfies the record invariants the engine relies on.

pub mod directory;
pub mod privacy;
pub mod raw;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use directory::read_activity_file;
use futures::{stream, StreamExt};
use privacy::PrivacyFilter;
use tracing::{error, info, instrument, warn};

use crate::engine::record::ActivityRecord;

/// Amount of record files read at the same time.
const MAX_FILES_IN_FLIGHT: usize = 4;

/// Loads the records of `day` from `files`. Records keep the order of `files` and the order of
/// lines inside each file.
#[instrument(skip(files, privacy), fields(files = files.len()))]
pub async fn collect_day(
    files: Vec<PathBuf>,
    day: NaiveDate,
    privacy: &PrivacyFilter,
) -> Result<Vec<ActivityRecord>> {
    let loaded = stream::iter(files)
        .map(|path| async move {
            let result = read_activity_file(&path).await;
            (path, result)
        })
        .buffered(MAX_FILES_IN_FLIGHT)
        .collect::<Vec<_>>()
        .await;

    let mut records = vec![];
    let mut excluded = 0usize;
    for (path, activities) in loaded {
        let activities =
            activities.inspect_err(|e| error!("Failed to process file {path:?} {e}"))?;
        for activity in activities {
            if privacy.excludes(&activity) {
                excluded += 1;
                continue;
            }
            match activity.normalize() {
                Ok(record) if record.timestamp().date_naive() == day => records.push(record),
                Ok(record) => warn!(
                    "Skipping '{}' from {path:?}, {} is outside of {day}",
                    record.title(),
                    record.timestamp()
                ),
                Err(e) => warn!("Skipping invalid record from {path:?}: {e}"),
            }
        }
    }

    info!(
        "Collected {} records for {day}, {excluded} excluded for privacy",
        records.len()
    );
    Ok(records)
}
