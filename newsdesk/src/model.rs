use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Image used when a feed entry carries none.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/400x300?text=No+Image+Available";

/// Coarse content category. Unknown names map to `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Topic {
    Politics,
    Business,
    Sports,
    Technology,
    Agriculture,
    Entertainment,
    Environment,
    Healthcare,
    General,
}

impl Topic {
    pub const ALL: [Topic; 9] = [
        Topic::Politics,
        Topic::Business,
        Topic::Sports,
        Topic::Technology,
        Topic::Agriculture,
        Topic::Entertainment,
        Topic::Environment,
        Topic::Healthcare,
        Topic::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Politics => "politics",
            Topic::Business => "business",
            Topic::Sports => "sports",
            Topic::Technology => "technology",
            Topic::Agriculture => "agriculture",
            Topic::Entertainment => "entertainment",
            Topic::Environment => "environment",
            Topic::Healthcare => "healthcare",
            Topic::General => "general",
        }
    }

    /// Case-insensitive lookup; `None` for names outside the enumeration.
    pub fn parse(name: &str) -> Option<Topic> {
        let name = name.trim();
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Topic {
    fn from(value: String) -> Self {
        Topic::parse(&value).unwrap_or(Topic::General)
    }
}

impl From<Topic> for String {
    fn from(value: Topic) -> Self {
        value.as_str().to_string()
    }
}

/// A configured feed endpoint. Immutable once the orchestrator is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,
    pub feed_url: String,
    /// When set, every article of this source gets this topic.
    pub topic_hint: Option<Topic>,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, feed_url: impl Into<String>, topic_hint: Option<Topic>) -> Self {
        Self {
            name: name.into(),
            feed_url: feed_url.into(),
            topic_hint,
        }
    }
}

/// One parsed feed entry, before classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawItem {
    pub title: String,
    pub url: String,
    pub body_text: String,
    pub published_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

/// The canonical stored article. `url` is the deduplication key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Assigned by the store when empty; never reassigned afterwards.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default = "default_topic")]
    pub topic: Topic,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub sentiment_score: f64,
    #[serde(default)]
    pub key_entities: Vec<String>,
    #[serde(default)]
    pub affected_states: Vec<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "Utc::now")]
    pub published_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_topic() -> Topic {
    Topic::General
}

impl Article {
    /// Article with the given key fields and empty metadata, timestamped now.
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            title: title.into(),
            url: url.into(),
            source: source.into(),
            topic: Topic::General,
            summary: String::new(),
            sentiment_score: 0.0,
            key_entities: Vec::new(),
            affected_states: Vec::new(),
            image_url: String::new(),
            published_at: now,
            created_at: now,
        }
    }

    /// True when `state` names one of the affected regions, ignoring case.
    pub fn affects(&self, state: &str) -> bool {
        self.affected_states
            .iter()
            .any(|s| s.eq_ignore_ascii_case(state.trim()))
    }
}
