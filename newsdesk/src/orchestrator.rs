use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use common::Config;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::classify::{Classifier, ClassifierTables};
use crate::error::StoreError;
use crate::ingestion::{FeedFetcher, HttpFeedFetcher};
use crate::model::{Article, RawItem, SourceDescriptor};
use crate::sources;
use crate::storage::{ArticleStore, Refresh};
use crate::text;

/// Drives fetch -> normalize -> classify -> save for every configured source.
pub struct Orchestrator {
    sources: Vec<SourceDescriptor>,
    fetcher: Arc<dyn FeedFetcher>,
    classifier: Classifier,
}

impl Orchestrator {
    pub fn new(sources: Vec<SourceDescriptor>, fetcher: Arc<dyn FeedFetcher>, classifier: Classifier) -> Self {
        Self {
            sources,
            fetcher,
            classifier,
        }
    }

    /// HTTP fetcher, configured sources (or the built-in list) and classifier tables.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFeedFetcher::new(
            Duration::from_secs(config.fetch.timeout_seconds.max(1)),
            &config.fetch.user_agent,
        )?;
        let tables = ClassifierTables::from_config(config.classifier.as_ref());
        Ok(Self::new(
            sources::from_config(&config.sources),
            Arc::new(fetcher),
            Classifier::new(tables),
        ))
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// One full pass over every source. Fetches run concurrently; saves happen
    /// in source order. Returns the number of net-new articles.
    pub async fn run_cycle(&self, store: &ArticleStore) -> Result<usize> {
        let fetched = join_all(self.sources.iter().map(|source| async move {
            let items = self.fetcher.fetch(source).await;
            (source, items)
        }))
        .await;

        let mut new_articles = 0;
        for (source, items) in fetched {
            info!(source = %source.name, url = %source.feed_url, count = items.len(), "processing feed items");
            new_articles += self.ingest_source(store, source, items).await;
        }

        info!(new_articles, sources = self.sources.len(), "ingestion cycle finished");
        Ok(new_articles)
    }

    async fn ingest_source(&self, store: &ArticleStore, source: &SourceDescriptor, items: Vec<RawItem>) -> usize {
        let mut new_articles = 0;
        for item in items {
            let Some(article) = self.build_article(source, item) else {
                continue;
            };
            let url = article.url.clone();
            match store.save(article).await {
                Ok(outcome) if outcome.is_new() => {
                    debug!(%url, "article saved");
                    new_articles += 1;
                }
                Ok(_) => debug!(%url, "article merged into existing record"),
                Err(StoreError::InvalidArticle) => {
                    warn!(source = %source.name, "skipping entry without url");
                }
                Err(e) => {
                    error!(source = %source.name, %url, error = %e, "failed to persist article");
                }
            }
        }
        new_articles
    }

    /// Classified article for one raw item, or `None` when it has no body.
    pub fn build_article(&self, source: &SourceDescriptor, item: RawItem) -> Option<Article> {
        let body = text::normalize(&item.body_text);
        if body.is_empty() {
            debug!(url = %item.url, "skipping entry with no content");
            return None;
        }

        let meta = self.classifier.classify(&item.title, &body);
        let now = Utc::now();
        Some(Article {
            id: String::new(),
            title: item.title,
            url: item.url,
            source: source.name.clone(),
            topic: source.topic_hint.unwrap_or(meta.topic),
            summary: meta.summary,
            sentiment_score: meta.sentiment_score,
            key_entities: meta.key_entities,
            affected_states: meta.affected_states,
            image_url: item.image_url.unwrap_or_default(),
            published_at: item.published_at.unwrap_or(now),
            created_at: now,
        })
    }
}

#[async_trait]
impl Refresh for Orchestrator {
    async fn run_cycle(&self, store: &ArticleStore) -> Result<usize> {
        Orchestrator::run_cycle(self, store).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Topic;
    use std::collections::HashMap;

    /// Serves canned items per feed url; unknown urls yield nothing.
    struct CannedFetcher {
        feeds: HashMap<String, Vec<RawItem>>,
    }

    #[async_trait]
    impl FeedFetcher for CannedFetcher {
        async fn fetch(&self, source: &SourceDescriptor) -> Vec<RawItem> {
            self.feeds.get(&source.feed_url).cloned().unwrap_or_default()
        }
    }

    fn item(url: &str, title: &str, body: &str) -> RawItem {
        RawItem {
            title: title.to_string(),
            url: url.to_string(),
            body_text: body.to_string(),
            published_at: None,
            image_url: None,
        }
    }

    fn orchestrator(sources: Vec<SourceDescriptor>, feeds: Vec<(&str, Vec<RawItem>)>) -> Orchestrator {
        let feeds = feeds.into_iter().map(|(url, items)| (url.to_string(), items)).collect();
        Orchestrator::new(sources, Arc::new(CannedFetcher { feeds }), Classifier::default())
    }

    #[tokio::test]
    async fn cycle_counts_only_new_articles() {
        let sources = vec![
            SourceDescriptor::new("Times of India", "http://toi/rss", None),
            SourceDescriptor::new("The Hindu", "http://hindu/rss", Some(Topic::Business)),
            SourceDescriptor::new("Broken", "http://broken/rss", None),
        ];
        let orch = orchestrator(
            sources,
            vec![
                (
                    "http://toi/rss",
                    vec![
                        item("https://toi/a", "New Agricultural Policy", "<p>Farmers in Punjab celebrate new policy</p>"),
                        item("https://toi/empty", "Empty", "<p>  </p>"),
                        item("", "No url", "Some body text"),
                    ],
                ),
                (
                    "http://hindu/rss",
                    vec![
                        item("https://hindu/b", "Cricket", "The team won the match."),
                        item("https://toi/a", "Duplicate", "Farmers again."),
                    ],
                ),
            ],
        );
        let store = ArticleStore::in_memory();

        assert_eq!(orch.run_cycle(&store).await.unwrap(), 2);
        assert_eq!(store.len().await, 2);

        // Second pass sees only known urls.
        assert_eq!(orch.run_cycle(&store).await.unwrap(), 0);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn topic_hint_overrides_classifier() {
        let sources = vec![SourceDescriptor::new("The Hindu", "http://hindu/rss", Some(Topic::Business))];
        let orch = orchestrator(
            sources,
            vec![("http://hindu/rss", vec![item("https://hindu/c", "Cricket", "The team won the match.")])],
        );
        let store = ArticleStore::in_memory();
        orch.run_cycle(&store).await.unwrap();
        let stored = store.find_by_url("https://hindu/c").await.unwrap();
        assert_eq!(stored.topic, Topic::Business);
        assert_eq!(stored.source, "The Hindu");
    }

    #[test]
    fn build_article_classifies_and_defaults() {
        let orch = orchestrator(vec![], vec![]);
        let source = SourceDescriptor::new("Times of India", "http://toi/rss", None);
        let article = orch
            .build_article(
                &source,
                item("https://toi/a", "New Agricultural Policy", "Farmers in Punjab celebrate new policy"),
            )
            .unwrap();
        assert_eq!(article.topic, Topic::Agriculture);
        assert_eq!(article.affected_states, vec!["Punjab"]);
        assert!(article.key_entities.contains(&"Farmers".to_string()));
        assert!(article.key_entities.contains(&"Policy".to_string()));
        assert!(!article.key_entities.contains(&"New".to_string()));
        assert_eq!(article.summary, "Farmers in Punjab celebrate new policy.");
        assert_eq!(article.published_at, article.created_at);
        assert!(article.image_url.is_empty());
    }
}
