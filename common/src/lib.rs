/*!
common/src/lib.rs

Shared configuration types for Newsdesk.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file
- A layered loader merging a default file with an override file
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Article store configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the JSON backing file (e.g. "data/articles.json").
    /// When absent the store lives in memory only.
    pub path: Option<String>,
    /// Maximum age of the last successful ingestion before a read refreshes
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,
    /// Optional capacity bound; the oldest articles are evicted beyond it
    pub max_articles: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            ttl_minutes: default_ttl_minutes(),
            max_articles: None,
        }
    }
}

fn default_ttl_minutes() -> u64 {
    15
}

/// Fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Newsdesk/0.1.0".to_string()
}

/// Scheduler (periodic ingestion) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Minutes between two scheduled ingestion cycles
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
        }
    }
}

fn default_interval_minutes() -> u64 {
    180
}

/// One configured feed source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Publisher name attached to every article of this feed
    pub name: String,
    pub url: String,
    /// Optional fixed topic for every article of this feed
    pub topic: Option<String>,
}

/// Keyword set for one topic, in table order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicKeywordsConfig {
    pub topic: String,
    pub keywords: Vec<String>,
}

/// Optional overrides of the built-in classifier tables.
/// Each present field replaces the corresponding table wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub topics: Option<Vec<TopicKeywordsConfig>>,
    pub gazetteer: Option<Vec<String>>,
    pub stop_words: Option<Vec<String>>,
    pub positive_words: Option<Vec<String>>,
    pub negative_words: Option<Vec<String>>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    pub classifier: Option<ClassifierConfig>,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for (path, label) in [(default_path, "default"), (override_path, "override")] {
            let Some(path) = path else { continue };
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {} config: {}", label, path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse {} configuration", label))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_string_with_defaults() {
        let toml = r#"
            [store]
            path = "data/test.json"

            [[sources]]
            name = "The Hindu"
            url = "https://www.thehindu.com/business/feeder/default.rss"
            topic = "business"
        "#;

        let cfg: Config = toml::from_str(toml).expect("parse config");
        assert_eq!(cfg.store.path.as_deref(), Some("data/test.json"));
        assert_eq!(cfg.store.ttl_minutes, 15);
        assert_eq!(cfg.fetch.timeout_seconds, 10);
        assert_eq!(cfg.scheduler.interval_minutes, 180);
        assert_eq!(cfg.sources.len(), 1);
        assert_eq!(cfg.sources[0].topic.as_deref(), Some("business"));
        assert!(cfg.classifier.is_none());
    }

    #[test]
    fn empty_document_is_a_valid_config() {
        let cfg: Config = toml::from_str("").expect("parse empty config");
        assert!(cfg.sources.is_empty());
        assert!(cfg.store.path.is_none());
        assert_eq!(cfg.fetch.user_agent, "Newsdesk/0.1.0");
    }

    #[tokio::test]
    async fn override_file_wins_over_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let default_path = dir.path().join("config.default.toml");
        let override_path = dir.path().join("config.toml");

        tokio::fs::write(
            &default_path,
            r#"
            [store]
            path = "data/articles.json"
            ttl_minutes = 15

            [fetch]
            timeout_seconds = 10
            "#,
        )
        .await
        .expect("write default");
        tokio::fs::write(
            &override_path,
            r#"
            [store]
            ttl_minutes = 5

            [classifier]
            gazetteer = ["Punjab"]
            "#,
        )
        .await
        .expect("write override");

        let cfg = Config::load_with_defaults(Some(default_path.as_path()), Some(override_path.as_path()))
            .await
            .expect("load merged config");
        assert_eq!(cfg.store.path.as_deref(), Some("data/articles.json"));
        assert_eq!(cfg.store.ttl_minutes, 5);
        assert_eq!(cfg.fetch.timeout_seconds, 10);
        let gazetteer = cfg.classifier.and_then(|c| c.gazetteer).expect("gazetteer override");
        assert_eq!(gazetteer, vec!["Punjab".to_string()]);
    }

    #[tokio::test]
    async fn missing_files_yield_default_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        let cfg = Config::load_with_defaults(Some(missing.as_path()), None).await.expect("load");
        assert_eq!(cfg.store.ttl_minutes, 15);
    }
}
