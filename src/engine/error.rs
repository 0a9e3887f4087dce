//! Faults raised by the engine. Everything that isn't listed here (unknown identity keys,
//! records no rule matches) is a normal outcome with a default policy, not an error.

use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, Duration, Local, NaiveDate};
use thiserror::Error;

use super::record::{Category, IdentityKey};

/// Aggregation input broke an invariant. Fatal for the whole run, statistics computed over a
/// partially dropped day would be wrong.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Record #{index} '{title}' ({identity_key}) at {timestamp} reached aggregation without a category")]
    MissingCategory {
        index: usize,
        title: Arc<str>,
        identity_key: IdentityKey,
        timestamp: DateTime<Local>,
    },
    #[error("Record #{index} '{title}' ({identity_key}) at {timestamp} is outside of {day}")]
    OutOfDay {
        index: usize,
        title: Arc<str>,
        identity_key: IdentityKey,
        timestamp: DateTime<Local>,
        day: NaiveDate,
    },
}

/// Configuration couldn't be loaded or didn't pass validation. Raised before any record is
/// processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Rule for '{category}' contains an empty pattern")]
    EmptyPattern { category: Category },

    #[error("Category '{category}' has more than one rule")]
    DuplicateCategory { category: Category },

    #[error("Pattern '{pattern}' is used by both '{first}' and '{second}'")]
    ConflictingPattern {
        pattern: String,
        first: Category,
        second: Category,
    },

    #[error("'{category}' is assigned when nothing matches and can't have a rule")]
    UnassignableCategory { category: Category },

    #[error("Rule for '{category}' has neither patterns nor domains")]
    EmptyRule { category: Category },

    #[error("Merge window of {seconds}s is longer than a day")]
    InvalidMergeWindow { seconds: u32 },

    #[error("Couldn't read configuration {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Couldn't parse configuration {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Record '{title}' has a negative duration of {duration}")]
    NegativeDuration { title: Arc<str>, duration: Duration },
}
