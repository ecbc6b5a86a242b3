use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::StoreConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::model::{Article, PLACEHOLDER_IMAGE_URL};
use crate::query::{self, ArticlePage, ArticleQuery, DistinctField, Stats};
use crate::sample;

/// Where the collection is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backing {
    /// A single JSON array, rewritten wholesale on every save.
    File(PathBuf),
    Memory,
}

impl Backing {
    pub fn from_config(config: &StoreConfig) -> Self {
        match config.path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Backing::File(PathBuf::from(path)),
            _ => Backing::Memory,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Maximum age of the last successful ingestion before a read refreshes.
    pub ttl: Duration,
    /// Beyond this many articles the oldest by `published_at` is evicted.
    pub max_articles: Option<usize>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(15),
            max_articles: None,
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            ttl: Duration::minutes(config.ttl_minutes as i64),
            max_articles: config.max_articles.filter(|m| *m > 0),
        }
    }
}

/// Runs one ingestion cycle into the given store, returning the number of
/// net-new articles. The orchestrator is the production implementation.
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn run_cycle(&self, store: &ArticleStore) -> Result<usize>;
}

/// Result of a save: whether the url was new or merged into an existing record.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Inserted(Article),
    Merged(Article),
}

impl SaveOutcome {
    pub fn article(&self) -> &Article {
        match self {
            SaveOutcome::Inserted(a) | SaveOutcome::Merged(a) => a,
        }
    }

    pub fn into_article(self) -> Article {
        match self {
            SaveOutcome::Inserted(a) | SaveOutcome::Merged(a) => a,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, SaveOutcome::Inserted(_))
    }
}

/// Articles in insertion order plus a url -> position index.
#[derive(Debug, Default)]
struct Collection {
    articles: Vec<Article>,
    index: HashMap<String, usize>,
}

impl Collection {
    fn from_articles(articles: Vec<Article>) -> Self {
        let mut collection = Collection::default();
        for article in articles {
            match prepare(article) {
                Ok(article) => {
                    collection.upsert(article);
                }
                Err(_) => warn!("dropping stored article without url"),
            }
        }
        collection
    }

    /// Last write wins for content; the stored `id` (when set) and
    /// `created_at` survive.
    fn upsert(&mut self, mut article: Article) -> SaveOutcome {
        match self.index.get(&article.url) {
            Some(&pos) => {
                let existing = &mut self.articles[pos];
                if !existing.id.trim().is_empty() {
                    article.id = existing.id.clone();
                }
                article.created_at = existing.created_at;
                *existing = article.clone();
                SaveOutcome::Merged(article)
            }
            None => {
                self.index.insert(article.url.clone(), self.articles.len());
                self.articles.push(article.clone());
                SaveOutcome::Inserted(article)
            }
        }
    }

    /// Evicts the oldest articles until at most `max` remain. The most
    /// recently inserted article is never the one evicted.
    fn evict_to(&mut self, max: usize) -> Vec<Article> {
        let mut evicted = Vec::new();
        while self.articles.len() > max.max(1) {
            let newest = self.articles.len() - 1;
            let oldest = self.articles[..newest]
                .iter()
                .enumerate()
                .min_by_key(|(_, a)| a.published_at)
                .map(|(i, _)| i);
            let Some(oldest) = oldest else { break };
            evicted.push(self.articles.remove(oldest));
        }
        if !evicted.is_empty() {
            self.rebuild_index();
        }
        evicted
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .articles
            .iter()
            .enumerate()
            .map(|(i, a)| (a.url.clone(), i))
            .collect();
    }

    fn get(&self, url: &str) -> Option<&Article> {
        self.index.get(url).map(|&pos| &self.articles[pos])
    }
}

#[derive(Debug, Default)]
struct RefreshState {
    last_refreshed_at: Option<DateTime<Utc>>,
}

/// Canonical article collection: url-keyed merge on save, JSON persistence,
/// filtered queries and the staleness-gated refresh.
pub struct ArticleStore {
    backing: Backing,
    options: StoreOptions,
    collection: RwLock<Collection>,
    // Held for the whole duration of a cycle; serializes scheduled and
    // read-triggered refreshes.
    refresh_gate: Mutex<RefreshState>,
    refresher: Option<Arc<dyn Refresh>>,
}

impl ArticleStore {
    /// Opens the store, loading the backing file when there is one.
    /// A missing file is an empty store; an unreadable one is an error.
    pub async fn open(backing: Backing, options: StoreOptions) -> StoreResult<Self> {
        let articles = match &backing {
            Backing::File(path) => load_articles(path).await?,
            Backing::Memory => Vec::new(),
        };
        let collection = Collection::from_articles(articles);
        info!(count = collection.articles.len(), backing = ?backing, "article store opened");

        Ok(Self {
            backing,
            options,
            collection: RwLock::new(collection),
            refresh_gate: Mutex::new(RefreshState::default()),
            refresher: None,
        })
    }

    /// Memory-only store with default options.
    pub fn in_memory() -> Self {
        Self {
            backing: Backing::Memory,
            options: StoreOptions::default(),
            collection: RwLock::new(Collection::default()),
            refresh_gate: Mutex::new(RefreshState::default()),
            refresher: None,
        }
    }

    /// Attaches the cycle runner used by staleness-triggered refreshes.
    pub fn with_refresher(mut self, refresher: Arc<dyn Refresh>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Inserts or merges by url, then persists the whole collection.
    ///
    /// On a persistence failure the in-memory collection keeps the mutation
    /// and the error is returned.
    pub async fn save(&self, article: Article) -> StoreResult<SaveOutcome> {
        let article = prepare(article)?;

        let mut collection = self.collection.write().await;
        let outcome = collection.upsert(article);
        if outcome.is_new() {
            if let Some(max) = self.options.max_articles {
                for evicted in collection.evict_to(max) {
                    debug!(url = %evicted.url, "evicted article over capacity");
                }
            }
        }
        self.persist(&collection.articles).await?;
        Ok(outcome)
    }

    pub async fn find_by_url(&self, url: &str) -> Option<Article> {
        self.collection.read().await.get(url).cloned()
    }

    /// Filtered, newest-first page. Refreshes first when stale; a failed
    /// refresh is reported in `error` and the current data is served.
    pub async fn get_articles(&self, query: &ArticleQuery) -> ArticlePage {
        let refresh_error = match self.ensure_fresh().await {
            Ok(()) => None,
            Err(e) => {
                error!(error = %e, "refresh before query failed");
                Some(e.to_string())
            }
        };

        let collection = self.collection.read().await;
        let mut page = query::select_page(&collection.articles, query);
        page.error = refresh_error;
        page
    }

    /// Sorted distinct values of `field`; unknown fields yield an empty list.
    pub async fn get_distinct(&self, field: &str) -> Vec<String> {
        let Some(field) = DistinctField::parse(field) else {
            debug!(%field, "distinct requested for unknown field");
            return Vec::new();
        };
        let collection = self.collection.read().await;
        query::distinct(&collection.articles, field)
    }

    pub async fn get_stats(&self) -> Stats {
        let collection = self.collection.read().await;
        query::stats(&collection.articles)
    }

    pub async fn len(&self) -> usize {
        self.collection.read().await.articles.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Copy of every article in insertion order.
    pub async fn snapshot(&self) -> Vec<Article> {
        self.collection.read().await.articles.clone()
    }

    pub async fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refresh_gate.lock().await.last_refreshed_at
    }

    /// Saves the fixed demonstration set and returns the stored records.
    pub async fn seed_sample(&self) -> StoreResult<Vec<Article>> {
        let mut saved = Vec::new();
        for article in sample::sample_articles() {
            saved.push(self.save(article).await?.into_article());
        }
        info!(count = saved.len(), "sample articles added");
        Ok(saved)
    }

    /// Seeds the demonstration set only when the collection is empty.
    /// Returns the number of seeded articles.
    pub async fn seed_if_empty(&self) -> StoreResult<usize> {
        if !self.is_empty().await {
            return Ok(0);
        }
        warn!("store is empty after ingestion, seeding placeholder articles");
        Ok(self.seed_sample().await?.len())
    }

    /// Rewrites the backing file with the current collection.
    pub async fn flush(&self) -> StoreResult<()> {
        let collection = self.collection.read().await;
        self.persist(&collection.articles).await
    }

    /// Startup: refresh when stale or empty.
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_fresh().await?;
        info!(count = self.len().await, "storage initialized");
        Ok(())
    }

    /// Runs a cycle unconditionally (scheduler entrypoint). Waits for any
    /// in-flight cycle first.
    pub async fn refresh(&self) -> Result<usize> {
        let Some(refresher) = self.refresher.clone() else {
            return Ok(0);
        };
        let mut state = self.refresh_gate.lock().await;
        self.run_refresh(&mut state, refresher.as_ref()).await
    }

    /// Runs a cycle when the data is stale or absent. Concurrent callers
    /// queue on the gate and re-check, so one stale period costs one cycle.
    pub async fn ensure_fresh(&self) -> Result<()> {
        let Some(refresher) = self.refresher.clone() else {
            return Ok(());
        };
        let mut state = self.refresh_gate.lock().await;
        if !self.is_stale(&state).await {
            return Ok(());
        }
        self.run_refresh(&mut state, refresher.as_ref()).await.map(|_| ())
    }

    async fn is_stale(&self, state: &RefreshState) -> bool {
        if self.is_empty().await {
            return true;
        }
        match state.last_refreshed_at {
            Some(at) => Utc::now() - at > self.options.ttl,
            None => true,
        }
    }

    async fn run_refresh(&self, state: &mut RefreshState, refresher: &dyn Refresh) -> Result<usize> {
        let was_empty = self.is_empty().await;
        info!(was_empty, "running ingestion cycle");

        match refresher.run_cycle(self).await {
            Ok(new_articles) => {
                state.last_refreshed_at = Some(Utc::now());
                info!(new_articles, "ingestion cycle complete");
                if new_articles == 0 && was_empty {
                    self.seed_if_empty().await?;
                }
                Ok(new_articles)
            }
            Err(e) => {
                error!(error = %e, "ingestion cycle failed");
                if let Err(seed_err) = self.seed_if_empty().await {
                    error!(error = %seed_err, "failed to seed placeholder articles");
                }
                Err(e)
            }
        }
    }

    async fn persist(&self, articles: &[Article]) -> StoreResult<()> {
        match &self.backing {
            Backing::File(path) => write_articles(path, articles).await,
            Backing::Memory => Ok(()),
        }
    }
}

/// Validates and fills defaults before a save.
fn prepare(mut article: Article) -> StoreResult<Article> {
    article.url = article.url.trim().to_string();
    if article.url.is_empty() {
        return Err(StoreError::InvalidArticle);
    }
    if article.id.trim().is_empty() {
        article.id = Uuid::new_v4().to_string();
    }
    if article.image_url.trim().is_empty() {
        article.image_url = PLACEHOLDER_IMAGE_URL.to_string();
    }
    article.sentiment_score = if article.sentiment_score.is_nan() {
        0.0
    } else {
        article.sentiment_score.clamp(-1.0, 1.0)
    };
    article.key_entities = distinct_non_empty(article.key_entities);
    article.affected_states = distinct_non_empty(article.affected_states);
    Ok(article)
}

/// Trims, drops empties and case-insensitive duplicates, keeps first order.
fn distinct_non_empty(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if value.is_empty() || out.iter().any(|v| v.eq_ignore_ascii_case(value)) {
            continue;
        }
        out.push(value.to_string());
    }
    out
}

async fn load_articles(path: &Path) -> StoreResult<Vec<Article>> {
    debug!(path = %path.display(), "loading articles");
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no articles file found, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(StoreError::Storage(e)),
    };
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&data).map_err(|e| StoreError::Corrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

async fn write_articles(path: &Path, articles: &[Article]) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec_pretty(articles)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!(count = articles.len(), path = %path.display(), "articles saved");
    Ok(())
}
