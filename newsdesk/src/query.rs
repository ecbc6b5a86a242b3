use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::Article;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 50;

/// Filter and page parameters for [`crate::storage::ArticleStore::get_articles`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleQuery {
    pub topic: Option<String>,
    pub source: Option<String>,
    pub state: Option<String>,
    pub page: usize,
    pub limit: usize,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            topic: None,
            source: None,
            state: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ArticleQuery {
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn page(mut self, page: usize, limit: usize) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    /// Page clamped to >= 1 and limit to [1, MAX_PAGE_SIZE].
    pub fn clamped(&self) -> (usize, usize) {
        (self.page.max(1), self.limit.clamp(1, MAX_PAGE_SIZE))
    }

    fn matches(&self, article: &Article) -> bool {
        if let Some(topic) = wanted(&self.topic) {
            if !article.topic.as_str().eq_ignore_ascii_case(topic) {
                return false;
            }
        }
        if let Some(source) = wanted(&self.source) {
            if !article.source.eq_ignore_ascii_case(source) {
                return false;
            }
        }
        if let Some(state) = wanted(&self.state) {
            if !article.affects(state) {
                return false;
            }
        }
        true
    }
}

fn wanted(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().map(str::trim).filter(|f| !f.is_empty())
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    /// Set when the answer could not be refreshed; the data is still consistent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collection-wide counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_articles: usize,
    #[serde(rename = "topics")]
    pub topic_count: usize,
    #[serde(rename = "sources")]
    pub source_count: usize,
    #[serde(rename = "states")]
    pub state_count: usize,
    #[serde(rename = "latestArticle")]
    pub latest_article: Option<DateTime<Utc>>,
}

/// Fields accepted by distinct-value lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctField {
    Topic,
    Source,
    AffectedStates,
}

impl DistinctField {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "topic" | "topics" => Some(DistinctField::Topic),
            "source" | "sources" => Some(DistinctField::Source),
            "affectedStates" | "state" | "states" => Some(DistinctField::AffectedStates),
            _ => None,
        }
    }
}

/// Filters, sorts newest first (stable, so insertion order breaks ties) and pages.
pub fn select_page(articles: &[Article], query: &ArticleQuery) -> ArticlePage {
    let (page, limit) = query.clamped();

    let mut filtered: Vec<&Article> = articles.iter().filter(|a| query.matches(a)).collect();
    filtered.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let total = filtered.len();
    let start = (page - 1).saturating_mul(limit);
    let selected = filtered
        .into_iter()
        .skip(start)
        .take(limit)
        .cloned()
        .collect();

    ArticlePage {
        articles: selected,
        total,
        page,
        total_pages: total.div_ceil(limit),
        error: None,
    }
}

/// Sorted distinct non-empty values; set-valued fields contribute every element.
pub fn distinct(articles: &[Article], field: DistinctField) -> Vec<String> {
    let values: BTreeSet<String> = match field {
        DistinctField::Topic => articles.iter().map(|a| a.topic.as_str().to_string()).collect(),
        DistinctField::Source => articles.iter().map(|a| a.source.clone()).collect(),
        DistinctField::AffectedStates => articles
            .iter()
            .flat_map(|a| a.affected_states.iter().cloned())
            .collect(),
    };
    values.into_iter().filter(|v| !v.trim().is_empty()).collect()
}

pub fn stats(articles: &[Article]) -> Stats {
    Stats {
        total_articles: articles.len(),
        topic_count: distinct(articles, DistinctField::Topic).len(),
        source_count: distinct(articles, DistinctField::Source).len(),
        state_count: distinct(articles, DistinctField::AffectedStates).len(),
        latest_article: articles.iter().map(|a| a.published_at).max(),
    }
}
