//! Shapes collectors hand records over in, and their normalization into [ActivityRecord].
//!
//! Each source derives its identity key from its own fields, the engine only ever compares keys.

use std::{path::Path, sync::Arc};

use chrono::{DateTime, Duration, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::engine::{
    error::RecordError,
    record::{duration_ser, ActivityRecord, IdentityKey, Source},
};

/// One line of a collector's output file, tagged by `source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RawActivity {
    Browser(BrowserVisit),
    AiChat(AiConversation),
    Git(GitEvent),
    Filesystem(FileTouch),
    Manual(ManualEntry),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserVisit {
    pub timestamp: DateTime<FixedOffset>,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub visit_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConversation {
    pub timestamp: DateTime<FixedOffset>,
    pub service: String,
    #[serde(default)]
    pub conversation_id: String,
    pub topic: String,
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub message_count: Option<u32>,
}

/// A commit, or an event like a branch switch when there is no `commit_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitEvent {
    pub timestamp: DateTime<FixedOffset>,
    pub repository: String,
    #[serde(default)]
    pub commit_hash: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    pub message: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub files_changed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTouch {
    pub timestamp: DateTime<FixedOffset>,
    pub path: String,
    /// Modification time of the file when it was seen.
    #[serde(default)]
    pub modified: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualEntry {
    pub timestamp: DateTime<FixedOffset>,
    pub title: String,
    #[serde(default)]
    pub detail: Option<String>,
    /// Seconds.
    #[serde(default, with = "duration_ser")]
    pub duration: Option<Duration>,
}

impl RawActivity {
    pub fn source(&self) -> Source {
        match self {
            RawActivity::Browser(_) => Source::Browser,
            RawActivity::AiChat(_) => Source::AiChat,
            RawActivity::Git(_) => Source::Git,
            RawActivity::Filesystem(_) => Source::Filesystem,
            RawActivity::Manual(_) => Source::Manual,
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        let timestamp = match self {
            RawActivity::Browser(v) => v.timestamp,
            RawActivity::AiChat(v) => v.timestamp,
            RawActivity::Git(v) => v.timestamp,
            RawActivity::Filesystem(v) => v.timestamp,
            RawActivity::Manual(v) => v.timestamp,
        };
        timestamp.with_timezone(&Local)
    }

    /// Same input always produces the same key. Events that can't be identified get
    /// [IdentityKey::unknown].
    pub fn identity_key(&self) -> IdentityKey {
        match self {
            RawActivity::Browser(v) => non_empty_key(normalize_url(&v.url)),
            RawActivity::AiChat(v) if v.conversation_id.trim().is_empty() => IdentityKey::unknown(),
            RawActivity::AiChat(v) => IdentityKey::new(format!(
                "{}:{}",
                v.service.trim().to_lowercase(),
                v.conversation_id.trim()
            )),
            RawActivity::Git(v) => match v.commit_hash.as_deref().map(str::trim) {
                Some(hash) if !hash.is_empty() => {
                    IdentityKey::new(format!("{}@{hash}", v.repository.trim()))
                }
                _ => IdentityKey::unknown(),
            },
            RawActivity::Filesystem(v) => match v.modified {
                Some(modified) => non_empty_key(format!("{}#{}", v.path, modified.timestamp())),
                None => non_empty_key(v.path.clone()),
            },
            RawActivity::Manual(_) => IdentityKey::unknown(),
        }
    }

    /// Converts a collector's record into the shape the engine works with.
    pub fn normalize(self) -> Result<ActivityRecord, RecordError> {
        let source = self.source();
        let timestamp = self.timestamp();
        let identity_key = self.identity_key();

        let record = match self {
            RawActivity::Browser(v) => {
                let title = if v.title.trim().is_empty() {
                    v.url.clone()
                } else {
                    v.title
                };
                let url: Arc<str> = v.url.into();
                ActivityRecord::new(source, timestamp, title, identity_key)
                    .with_detail(url.clone())
                    .with_url(url)
            }
            RawActivity::AiChat(v) => ActivityRecord::new(
                source,
                timestamp,
                format!("{} Chat: {}", capitalize(v.service.trim()), v.topic),
                identity_key,
            )
            .with_detail(v.user_message.unwrap_or_default()),
            RawActivity::Git(v) => {
                let title = v.message.lines().next().unwrap_or_default().to_string();
                let detail = match v.branch {
                    Some(branch) => format!("{} on {branch}", v.repository),
                    None => v.repository,
                };
                ActivityRecord::new(source, timestamp, title, identity_key).with_detail(detail)
            }
            RawActivity::Filesystem(v) => {
                let title = Path::new(&v.path)
                    .file_name()
                    .map(|v| v.to_string_lossy().to_string())
                    .unwrap_or_else(|| v.path.clone());
                ActivityRecord::new(source, timestamp, title, identity_key).with_detail(v.path)
            }
            RawActivity::Manual(v) => {
                let record = ActivityRecord::new(source, timestamp, v.title, identity_key)
                    .with_detail(v.detail.unwrap_or_default());
                match v.duration {
                    Some(duration) => record.with_duration(duration)?,
                    None => record,
                }
            }
        };
        Ok(record)
    }
}

fn non_empty_key(value: String) -> IdentityKey {
    if value.trim().is_empty() {
        IdentityKey::unknown()
    } else {
        IdentityKey::new(value)
    }
}

/// Url without the fragment and the trailing slash of its path. Scheme and host are lowercased by
/// the parser. Urls that don't parse are only trimmed and lowercased.
pub fn normalize_url(value: &str) -> String {
    let Ok(mut url) = Url::parse(value.trim()) else {
        return value.trim().to_lowercase();
    };
    url.set_fragment(None);
    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }
    let mut normalized = url.to_string();
    if url.path() == "/" && url.query().is_none() {
        normalized.truncate(normalized.trim_end_matches('/').len());
    }
    normalized
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod raw_tests {
    use chrono::{DateTime, Duration, FixedOffset};

    use crate::engine::record::{IdentityKey, Source};

    use super::{
        normalize_url, AiConversation, BrowserVisit, FileTouch, GitEvent, ManualEntry, RawActivity,
    };

    fn time(value: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(value).unwrap()
    }

    fn visit(url: &str) -> RawActivity {
        RawActivity::Browser(BrowserVisit {
            timestamp: time("2025-03-15T09:00:00+00:00"),
            url: url.into(),
            title: "GitHub".into(),
            browser: Some("chrome".into()),
            visit_count: Some(2),
        })
    }

    #[test]
    fn urls_are_normalized() {
        assert_eq!(
            normalize_url("HTTPS://GitHub.com/Anoromi/#readme"),
            "https://github.com/Anoromi"
        );
        assert_eq!(normalize_url("https://github.com/"), "https://github.com");
        assert_eq!(normalize_url("https://github.com"), "https://github.com");
        assert_eq!(
            normalize_url("https://example.com/search?q=rust"),
            "https://example.com/search?q=rust"
        );
        assert_eq!(normalize_url("  Not A Url "), "not a url");
    }

    #[test]
    fn same_page_has_same_key() {
        assert_eq!(
            visit("https://github.com/daylog#issues").identity_key(),
            visit("https://GITHUB.com/daylog/").identity_key()
        );
        assert_ne!(
            visit("https://github.com/daylog").identity_key(),
            visit("https://github.com/daylog/pulls").identity_key()
        );
        assert!(visit(" ").identity_key().is_unknown());
    }

    #[test]
    fn git_keys_need_a_hash() {
        let mut event = GitEvent {
            timestamp: time("2025-03-15T10:00:00+01:00"),
            repository: "DayLog".into(),
            commit_hash: Some("a1b2c3d4".into()),
            branch: Some("main".into()),
            message: "Add browser collector\n\nLonger description".into(),
            author: None,
            files_changed: vec![],
        };
        assert_eq!(
            RawActivity::Git(event.clone()).identity_key(),
            IdentityKey::new("DayLog@a1b2c3d4")
        );

        let record = RawActivity::Git(event.clone()).normalize().unwrap();
        assert_eq!(record.title(), "Add browser collector");
        assert_eq!(record.detail(), "DayLog on main");
        assert_eq!(record.source(), Source::Git);

        event.commit_hash = None;
        assert!(RawActivity::Git(event).identity_key().is_unknown());
    }

    #[test]
    fn chat_key_uses_service_and_conversation() {
        let chat = RawActivity::AiChat(AiConversation {
            timestamp: time("2025-03-15T11:00:00+00:00"),
            service: "ChatGPT".into(),
            conversation_id: "conv_001".into(),
            topic: "Programming".into(),
            user_message: Some("How do I parse JSON?".into()),
            message_count: Some(6),
        });
        assert_eq!(chat.identity_key(), IdentityKey::new("chatgpt:conv_001"));
        let record = chat.normalize().unwrap();
        assert_eq!(record.title(), "ChatGPT Chat: Programming");
        assert_eq!(record.detail(), "How do I parse JSON?");
    }

    #[test]
    fn file_key_includes_modification_time() {
        let touch = |modified: Option<&str>| {
            RawActivity::Filesystem(FileTouch {
                timestamp: time("2025-03-15T12:00:00+00:00"),
                path: "/home/user/notes.md".into(),
                modified: modified.map(time),
            })
        };
        assert_eq!(
            touch(Some("1970-01-01T00:01:40+00:00")).identity_key(),
            IdentityKey::new("/home/user/notes.md#100")
        );
        assert_eq!(
            touch(None).identity_key(),
            IdentityKey::new("/home/user/notes.md")
        );
        assert_eq!(touch(None).normalize().unwrap().title(), "notes.md");
    }

    #[test]
    fn browser_record_keeps_url() {
        let record = visit("https://github.com/daylog").normalize().unwrap();
        assert_eq!(record.url(), Some("https://github.com/daylog"));
        assert_eq!(record.domain().as_deref(), Some("github.com"));
        assert_eq!(record.category(), None);
    }

    #[test]
    fn manual_entries_parse_from_json() {
        let raw: RawActivity = serde_json::from_str(
            r#"{"source":"manual","timestamp":"2025-03-15T14:00:00+00:00","title":"Planning","duration":5400}"#,
        )
        .unwrap();
        assert!(raw.identity_key().is_unknown());
        let record = raw.normalize().unwrap();
        assert_eq!(record.duration(), Some(Duration::minutes(90)));

        let negative = serde_json::from_str::<RawActivity>(
            r#"{"source":"manual","timestamp":"2025-03-15T14:00:00+00:00","title":"Planning","duration":-1}"#,
        );
        assert!(negative.is_err());
    }

    #[test]
    fn manual_entry_without_duration_is_a_point() {
        let record = RawActivity::Manual(ManualEntry {
            timestamp: time("2025-03-15T14:00:00+00:00"),
            title: "Call".into(),
            detail: None,
            duration: None,
        })
        .normalize()
        .unwrap();
        assert_eq!(record.duration(), None);
    }
}
