use super::raw::RawActivity;

/// Drops browser visits that shouldn't end up in a report at all, like banking pages. Patterns
/// are matched case-insensitively against the url and the page title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivacyFilter {
    exclude_urls: Vec<String>,
}

impl PrivacyFilter {
    pub fn new(exclude_urls: impl IntoIterator<Item = String>) -> Self {
        Self {
            exclude_urls: exclude_urls
                .into_iter()
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .collect(),
        }
    }

    pub fn excludes(&self, activity: &RawActivity) -> bool {
        let RawActivity::Browser(visit) = activity else {
            return false;
        };
        let url = visit.url.to_lowercase();
        let title = visit.title.to_lowercase();
        self.exclude_urls
            .iter()
            .any(|pattern| url.contains(pattern.as_str()) || title.contains(pattern.as_str()))
    }
}
