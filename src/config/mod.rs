//! Settings file of daylog.
//!
//! The file is plain JSON, every field is optional:
//!
//! ```json
//! {
//!     "merge_window_seconds": 60,
//!     "categories": [
//!         { "category": "work", "patterns": ["github", "docs"], "domains": ["github.com"] }
//!     ],
//!     "privacy": { "exclude_urls": ["banking"] }
//! }
//! ```
//!
//! Everything is validated by [Settings::validate] before any record is read.

use std::{io::ErrorKind, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    collection::privacy::PrivacyFilter,
    engine::{
        categorize::{default_rules, CategoryRule, CategoryRuleSet},
        dedupe::MergeWindow,
        error::ConfigError,
        EngineConfig,
    },
};

pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub merge_window_seconds: u32,
    /// Ordered, earlier rules win.
    pub categories: Vec<CategoryRule>,
    pub privacy: PrivacySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            merge_window_seconds: MergeWindow::DEFAULT_SECONDS,
            categories: default_rules(),
            privacy: PrivacySettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub exclude_urls: Vec<String>,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            exclude_urls: vec!["private".into(), "password".into(), "banking".into()],
        }
    }
}

/// Settings that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedSettings {
    pub engine: EngineConfig,
    pub privacy: PrivacyFilter,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded settings from {path:?}");
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads settings, writing out the defaults first if the file doesn't exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(_) => Self::load(path),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let settings = Settings::default();
                settings.save(path)?;
                info!("Created default settings at {path:?}");
                Ok(settings)
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).map_err(io_error)
    }

    pub fn validate(self) -> Result<ValidatedSettings, ConfigError> {
        let merge_window = MergeWindow::new_opt(self.merge_window_seconds).ok_or(
            ConfigError::InvalidMergeWindow {
                seconds: self.merge_window_seconds,
            },
        )?;
        Ok(ValidatedSettings {
            engine: EngineConfig {
                rules: CategoryRuleSet::new(self.categories)?,
                merge_window,
            },
            privacy: PrivacyFilter::new(self.privacy.exclude_urls),
        })
    }
}

#[cfg(test)]
mod config_tests {
    use std::fs;

    use anyhow::Result;
    use chrono::Duration;
    use tempfile::tempdir;

    use crate::engine::{categorize::CategoryRuleSet, error::ConfigError, record::Category};

    use super::Settings;

    #[test]
    fn missing_fields_use_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "merge_window_seconds": 90 }"#)?;

        let validated = Settings::load(&path)?.validate()?;
        assert_eq!(
            validated.engine.merge_window.as_duration(),
            Duration::seconds(90)
        );
        assert_eq!(validated.engine.rules, CategoryRuleSet::default());
        Ok(())
    }

    #[test]
    fn rules_keep_their_order() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "categories": [
                { "category": "entertainment", "patterns": ["youtube"] },
                { "category": "work", "patterns": ["github.com", "stackoverflow"] }
            ] }"#,
        )?;

        let validated = Settings::load(&path)?.validate()?;
        let categories = validated
            .engine
            .rules
            .rules()
            .iter()
            .map(|v| v.category)
            .collect::<Vec<_>>();
        assert_eq!(categories, vec![Category::Entertainment, Category::Work]);
        Ok(())
    }

    #[test]
    fn malformed_rules_fail_validation() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "categories": [ { "category": "work", "patterns": [""] } ] }"#,
        )?;
        assert!(matches!(
            Settings::load(&path)?.validate(),
            Err(ConfigError::EmptyPattern { .. })
        ));

        fs::write(&path, r#"{ "categories": [ { "category": "chores" } ] }"#)?;
        assert!(matches!(
            Settings::load(&path),
            Err(ConfigError::Parse { .. })
        ));
        Ok(())
    }

    #[test]
    fn oversized_merge_window_is_rejected() {
        let settings = Settings {
            merge_window_seconds: 2 * 24 * 60 * 60,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidMergeWindow { .. })
        ));
    }

    #[test]
    fn defaults_are_written_once() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("settings.json");

        let created = Settings::load_or_create(&path)?;
        assert_eq!(created, Settings::default());
        assert!(path.exists());

        fs::write(&path, r#"{ "merge_window_seconds": 5 }"#)?;
        assert_eq!(Settings::load_or_create(&path)?.merge_window_seconds, 5);
        Ok(())
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Settings::load(&dir.path().join("absent.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
