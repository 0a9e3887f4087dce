use std::collections::HashMap;

use chrono::Duration;
use tracing::{debug, instrument, trace};

use super::record::{ActivityRecord, IdentityKey, Source};

/// Maximum distance between two records of the same event. Records of the same source and identity
/// further apart than this are separate events, for example visiting a page again in the evening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeWindow(Duration);

impl MergeWindow {
    pub const DEFAULT_SECONDS: u32 = 60;
    /// The engine only ever sees one day.
    pub const MAX_SECONDS: u32 = 24 * 60 * 60;

    /// `None` for windows longer than [MergeWindow::MAX_SECONDS].
    pub fn new_opt(seconds: u32) -> Option<Self> {
        (seconds <= Self::MAX_SECONDS).then(|| Self::from_seconds(seconds))
    }

    fn from_seconds(seconds: u32) -> Self {
        Self(Duration::seconds(seconds as i64))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// A gap of exactly the window is not a merge.
    fn merges(&self, a: &ActivityRecord, b: &ActivityRecord) -> bool {
        (a.timestamp() - b.timestamp()).abs() < self.0
    }
}

impl Default for MergeWindow {
    fn default() -> Self {
        Self::from_seconds(Self::DEFAULT_SECONDS)
    }
}

/// Collapses records describing the same event. Records are grouped by source and identity key,
/// each group is walked in time order and split into clusters: a record closer than `window` to
/// the earliest record of the current cluster joins it, anything else starts a new one. Only the
/// earliest record of every cluster survives, so the result doesn't depend on input order.
///
/// Output order is the order in which events were first seen. A survivor takes the position of
/// the first arrived record of its cluster.
#[instrument(skip(records), fields(count = records.len()))]
pub fn dedupe(records: Vec<ActivityRecord>, window: MergeWindow) -> Vec<ActivityRecord> {
    let mut groups = HashMap::<(Source, IdentityKey), Vec<usize>>::new();
    // (first seen position, survivor index)
    let mut survivors = Vec::<(usize, usize)>::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        if record.identity_key().is_unknown() {
            survivors.push((index, index));
            continue;
        }
        groups
            .entry((record.source(), record.identity_key().clone()))
            .or_default()
            .push(index);
    }

    for mut members in groups.into_values() {
        // Stable, equal timestamps stay in arrival order.
        members.sort_by_key(|v| records[*v].timestamp());

        let mut cluster: Option<(usize, usize)> = None;
        for index in members {
            match cluster {
                Some((slot, earliest)) if window.merges(&records[earliest], &records[index]) => {
                    trace!(
                        "Merging {} at {} into {}",
                        records[index].identity_key(),
                        records[index].timestamp(),
                        records[earliest].timestamp()
                    );
                    cluster = Some((slot.min(index), earliest));
                }
                _ => {
                    survivors.extend(cluster);
                    cluster = Some((index, index));
                }
            }
        }
        survivors.extend(cluster);
    }

    // Clusters are disjoint, so no two survivors share a position.
    survivors.sort_unstable_by_key(|(slot, _)| *slot);

    let total = records.len();
    let mut records = records.into_iter().map(Some).collect::<Vec<_>>();
    let kept = survivors
        .into_iter()
        .filter_map(|(_, index)| records[index].take())
        .collect::<Vec<_>>();

    debug!(
        "Dropped {} duplicate records, {} left",
        total - kept.len(),
        kept.len()
    );
    kept
}
