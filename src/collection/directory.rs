use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};
use tracing::{debug, warn};

use crate::utils::time::date_to_record_name;

use super::raw::RawActivity;

pub const RECORD_EXTENSION: &str = "jsonl";

/// Folder collectors hand their records over in.
///  - Every day has its own sub folder named by [date_to_record_name].
///  - Each collector writes one or more `.jsonl` files into it, a [RawActivity] per line.
pub struct RecordDirectory {
    record_dir: PathBuf,
}

impl RecordDirectory {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }

    pub fn day_dir(&self, day: NaiveDate) -> PathBuf {
        self.record_dir.join(date_to_record_name(day))
    }

    /// Record files for `day`, sorted by name so that runs read them in the same order.
    pub async fn files_for(&self, day: NaiveDate) -> Result<Vec<PathBuf>> {
        let dir = self.day_dir(day);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No records for {day} in {dir:?}");
                return Ok(vec![]);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to list {dir:?}")),
        };

        let mut files = vec![];
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|v| v == RECORD_EXTENSION)
                && entry.file_type().await?.is_file()
            {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Reads every activity from a collector file. The file is read under a shared lock, collectors
/// hold an exclusive one while writing.
pub async fn read_activity_file(path: &Path) -> Result<Vec<RawActivity>> {
    async fn extract(path: &Path) -> std::result::Result<Vec<RawActivity>, std::io::Error> {
        debug!("Extracting {path:?}");
        let file = File::open(path).await?;
        file.lock_shared()?;
        let buffer = BufReader::new(file);
        let mut lines = buffer.lines();
        let mut activities = vec![];
        while let Some(v) = lines.next_line().await? {
            if v.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RawActivity>(&v) {
                Ok(v) => activities.push(v),
                Err(e) => {
                    // Collectors can get interrupted mid write, the rest of the file is still
                    // usable.
                    warn!(
                        "During parsing in path {:?} found illegal json string {}:  {e}",
                        path, &v
                    )
                }
            }
        }

        lines.into_inner().into_inner().unlock_async().await?;

        Ok(activities)
    }

    match extract(path).await {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Record file {path:?} disappeared before it could be read");
            Ok(vec![])
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read records from {path:?}")),
    }
}
