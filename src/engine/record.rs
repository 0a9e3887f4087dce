use std::{fmt::Display, sync::Arc};

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::RecordError;

/// Where a record was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Browser,
    AiChat,
    Git,
    Filesystem,
    Manual,
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Browser => write!(f, "browser"),
            Source::AiChat => write!(f, "ai_chat"),
            Source::Git => write!(f, "git"),
            Source::Filesystem => write!(f, "filesystem"),
            Source::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Work,
    Learning,
    Entertainment,
    General,
    Uncategorized,
}

impl Category {
    /// Work and learning count towards the productivity score.
    pub fn is_productive(&self) -> bool {
        matches!(self, Category::Work | Category::Learning)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Work => write!(f, "work"),
            Category::Learning => write!(f, "learning"),
            Category::Entertainment => write!(f, "entertainment"),
            Category::General => write!(f, "general"),
            Category::Uncategorized => write!(f, "uncategorized"),
        }
    }
}

/// Stable string identifying the event a record describes. Two records of the same source with
/// the same key are the same event, if they happened close enough to each other.
///
/// An empty key means the collector couldn't identify the event. Such records are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(Arc<str>);

impl IdentityKey {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn unknown() -> Self {
        Self("".into())
    }

    pub fn is_unknown(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unknown() {
            write!(f, "<unknown>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A single normalized activity. Every collector produces these and the whole engine operates on
/// them.
///
/// Records are never changed in place. The only field filled in after construction is the
/// category, and [ActivityRecord::with_category] consumes the record to produce a categorized one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    source: Source,
    timestamp: DateTime<Local>,
    #[serde(with = "duration_ser", skip_serializing_if = "Option::is_none")]
    duration: Option<Duration>,
    title: Arc<str>,
    detail: Arc<str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<Arc<str>>,
    identity_key: IdentityKey,
    category: Option<Category>,
}

impl ActivityRecord {
    pub fn new(
        source: Source,
        timestamp: DateTime<Local>,
        title: impl Into<Arc<str>>,
        identity_key: IdentityKey,
    ) -> Self {
        Self {
            source,
            timestamp,
            duration: None,
            title: title.into(),
            detail: "".into(),
            url: None,
            identity_key,
            category: None,
        }
    }

    pub fn with_detail(self, detail: impl Into<Arc<str>>) -> Self {
        Self {
            detail: detail.into(),
            ..self
        }
    }

    pub fn with_url(self, url: impl Into<Arc<str>>) -> Self {
        Self {
            url: Some(url.into()),
            ..self
        }
    }

    pub fn with_duration(self, duration: Duration) -> Result<Self, RecordError> {
        if duration < Duration::zero() {
            return Err(RecordError::NegativeDuration {
                title: self.title,
                duration,
            });
        }
        Ok(Self {
            duration: Some(duration),
            ..self
        })
    }

    pub fn with_category(self, category: Category) -> Self {
        Self {
            category: Some(category),
            ..self
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn identity_key(&self) -> &IdentityKey {
        &self.identity_key
    }

    /// `None` until the record went through categorization.
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Text rules are matched against.
    pub fn text(&self) -> String {
        if self.detail.is_empty() {
            self.title.to_string()
        } else {
            format!("{} {}", self.title, self.detail)
        }
    }

    /// Lowercased host of the record's url, if it has one that parses.
    pub fn domain(&self) -> Option<String> {
        let url = Url::parse(self.url.as_deref()?).ok()?;
        url.host_str().map(|v| v.to_lowercase())
    }
}

/// Durations are stored as whole seconds.
pub(crate) mod duration_ser {
    use chrono::Duration;
    use serde::{self, de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(v) => serializer.serialize_some(&v.num_seconds()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<i64>::deserialize(deserializer)? {
            Some(s) if s < 0 => Err(D::Error::custom(format!(
                "duration can't be negative, got {s}"
            ))),
            Some(s) => Ok(Some(Duration::seconds(s))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod record_tests {
    use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

    use super::{ActivityRecord, Category, IdentityKey, Source};

    const TEST_DATE_TIME: NaiveDateTime = NaiveDateTime::new(
        NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
        NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
    );

    fn record() -> ActivityRecord {
        ActivityRecord::new(
            Source::Browser,
            Local.from_local_datetime(&TEST_DATE_TIME).unwrap(),
            "Rust docs",
            IdentityKey::new("https://doc.rust-lang.org/std"),
        )
    }

    #[test]
    fn record_starts_without_category() {
        let record = record();
        assert_eq!(record.category(), None);
        assert_eq!(
            record.with_category(Category::Learning).category(),
            Some(Category::Learning)
        );
    }

    #[test]
    fn negative_duration_is_rejected() {
        assert!(record().with_duration(Duration::seconds(-1)).is_err());
        let record = record().with_duration(Duration::minutes(5)).unwrap();
        assert_eq!(record.duration(), Some(Duration::minutes(5)));
    }

    #[test]
    fn domain_is_lowercased_host() {
        let with_url = record().with_url("https://Doc.Rust-Lang.org/std/index.html");
        assert_eq!(with_url.domain().as_deref(), Some("doc.rust-lang.org"));
        assert_eq!(record().domain(), None);
    }

    #[test]
    fn blank_identity_key_is_unknown() {
        assert!(IdentityKey::unknown().is_unknown());
        assert!(IdentityKey::new("  ").is_unknown());
        assert!(!IdentityKey::new("a1b2c3").is_unknown());
    }
}
