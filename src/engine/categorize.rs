use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{
    error::ConfigError,
    record::{ActivityRecord, Category, Source},
};

/// Patterns that put a record into `category`.
///
/// `patterns` are searched for in the record's title and detail (and in the host of browser
/// records). `domains` only apply to browser records and match the host or any of its subdomains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
}

impl CategoryRule {
    fn matches(&self, text: &str, domain: Option<&str>) -> bool {
        let pattern_match = self
            .patterns
            .iter()
            .any(|p| text.contains(p.as_str()) || domain.is_some_and(|d| d.contains(p.as_str())));

        pattern_match
            || domain.is_some_and(|d| self.domains.iter().any(|v| domain_matches(d, v)))
    }
}

fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Ordered, validated rules. Rules earlier in the list win over later ones.
///
/// Can only be created through [CategoryRuleSet::new], so every rule set in use has already been
/// checked and categorization itself can't fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryRuleSet {
    rules: Vec<CategoryRule>,
}

impl CategoryRuleSet {
    pub fn new(rules: Vec<CategoryRule>) -> Result<Self, ConfigError> {
        let mut seen_patterns = HashMap::<(bool, String), Category>::new();
        let mut normalized = Vec::with_capacity(rules.len());

        for rule in rules {
            let category = rule.category;
            if category == Category::Uncategorized {
                return Err(ConfigError::UnassignableCategory { category });
            }
            if normalized.iter().any(|v: &CategoryRule| v.category == category) {
                return Err(ConfigError::DuplicateCategory { category });
            }
            if rule.patterns.is_empty() && rule.domains.is_empty() {
                return Err(ConfigError::EmptyRule { category });
            }

            let mut normalize = |values: Vec<String>, is_domain: bool| {
                let mut result = Vec::with_capacity(values.len());
                for value in values {
                    let value = value.trim().to_lowercase();
                    if value.is_empty() {
                        return Err(ConfigError::EmptyPattern { category });
                    }
                    match seen_patterns.get(&(is_domain, value.clone())) {
                        Some(first) if *first != category => {
                            return Err(ConfigError::ConflictingPattern {
                                pattern: value,
                                first: *first,
                                second: category,
                            });
                        }
                        Some(_) => continue,
                        None => {
                            seen_patterns.insert((is_domain, value.clone()), category);
                        }
                    }
                    result.push(value);
                }
                Ok(result)
            };

            let patterns = normalize(rule.patterns, false)?;
            let domains = normalize(rule.domains, true)?;
            normalized.push(CategoryRule {
                category,
                patterns,
                domains,
            });
        }

        Ok(Self { rules: normalized })
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }
}

impl Default for CategoryRuleSet {
    fn default() -> Self {
        // Already lowercase and conflict free, see `default_rules_are_valid`.
        Self {
            rules: default_rules(),
        }
    }
}

/// Rules used when the configuration doesn't list any.
pub fn default_rules() -> Vec<CategoryRule> {
    fn rule(category: Category, patterns: &[&str], domains: &[&str]) -> CategoryRule {
        CategoryRule {
            category,
            patterns: patterns.iter().map(|v| v.to_string()).collect(),
            domains: domains.iter().map(|v| v.to_string()).collect(),
        }
    }

    vec![
        rule(
            Category::Work,
            &[
                "github",
                "stackoverflow",
                "docs",
                "api",
                // AI chats about code, troubleshooting and writing.
                "programming",
                "code",
                "debug",
                "function",
                "python",
                "javascript",
                "git",
                "problem solving",
                "fix",
                "error",
                "issue",
                "troubleshoot",
                "write",
                "generate",
                "create",
                "design",
                "plan",
            ],
            &["github.com", "stackoverflow.com", "docs.microsoft.com"],
        ),
        rule(
            Category::Learning,
            &[
                "tutorial",
                "course",
                "learn",
                "guide",
                "explain",
                "what is",
                "how to",
                "understand",
            ],
            &["wikipedia.org", "coursera.org", "udemy.com"],
        ),
        rule(
            Category::Entertainment,
            &["youtube", "netflix", "game", "social"],
            &["youtube.com", "netflix.com", "twitch.tv"],
        ),
    ]
}

/// First rule that matches decides the category, [Category::Uncategorized] if none do.
pub fn categorize(record: &ActivityRecord, rules: &CategoryRuleSet) -> Category {
    let text = record.text().to_lowercase();
    let domain = match record.source() {
        Source::Browser => record.domain(),
        _ => None,
    };

    rules
        .rules
        .iter()
        .find(|rule| rule.matches(&text, domain.as_deref()))
        .map(|rule| rule.category)
        .unwrap_or(Category::Uncategorized)
}

#[instrument(skip(records, rules), fields(count = records.len()))]
pub fn categorize_all(records: Vec<ActivityRecord>, rules: &CategoryRuleSet) -> Vec<ActivityRecord> {
    let categorized = records
        .into_iter()
        .map(|record| {
            let category = categorize(&record, rules);
            record.with_category(category)
        })
        .collect::<Vec<_>>();
    debug!(
        "{} records left uncategorized",
        categorized
            .iter()
            .filter(|v| v.category() == Some(Category::Uncategorized))
            .count()
    );
    categorized
}
