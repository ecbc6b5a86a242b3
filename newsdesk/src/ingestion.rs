use anyhow::Context;
use async_trait::async_trait;
use feed_rs::model::{Entry, Link};
use feed_rs::parser;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::FetchError;
use crate::model::{RawItem, SourceDescriptor};
use crate::text;

/// Retrieves one source's entries. Implementations never fail: a broken
/// source yields an empty list.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &SourceDescriptor) -> Vec<RawItem>;
}

/// reqwest + feed-rs fetcher. One shared client carries the timeout.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client })
    }

    /// Single retrieval of `url`, parsed into raw items.
    pub async fn try_fetch(&self, url: &str) -> Result<Vec<RawItem>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let bytes = response.bytes().await?;
        parse_feed(bytes.as_ref())
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, source: &SourceDescriptor) -> Vec<RawItem> {
        info!(source = %source.name, url = %source.feed_url, "fetching feed");
        match self.try_fetch(&source.feed_url).await {
            Ok(items) => {
                info!(source = %source.name, count = items.len(), "feed parsed");
                items
            }
            Err(e) => {
                warn!(source = %source.name, url = %source.feed_url, error = %e, "feed fetch failed, treating as empty");
                Vec::new()
            }
        }
    }
}

/// Parses an RSS or Atom document into raw items.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<RawItem>, FetchError> {
    let feed = parser::parse(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;
    Ok(feed.entries.iter().map(raw_item_from_entry).collect())
}

fn raw_item_from_entry(entry: &Entry) -> RawItem {
    // 1. Basic fields
    let title = text::normalize_opt(entry.title.as_ref().map(|t| t.content.as_str()));
    let url = select_entry_link(entry);
    let body = entry
        .content
        .as_ref()
        .and_then(|c| c.body.clone())
        .filter(|b| !b.trim().is_empty())
        .or_else(|| entry.summary.as_ref().map(|s| s.content.clone()))
        .unwrap_or_default();
    let published_at = entry.published.or(entry.updated);

    // 2. Image, searched in preference order
    let image_url = select_media_image(entry)
        .or_else(|| select_attachment_image(&entry.links))
        .or_else(|| select_inline_image(&body, &url));

    if image_url.is_none() {
        debug!(%url, "no image found for entry");
    }

    RawItem {
        title,
        url,
        body_text: body,
        published_at,
        image_url,
    }
}

fn select_entry_link(entry: &Entry) -> String {
    for link in &entry.links {
        let href = link.href.trim();
        if href.is_empty() {
            continue;
        }
        let rel = link.rel.as_deref().unwrap_or("");
        if rel.is_empty() || rel.eq_ignore_ascii_case("alternate") {
            return href.to_string();
        }
    }
    if let Some(link) = entry.links.iter().find(|l| !l.href.trim().is_empty()) {
        return link.href.trim().to_string();
    }
    let id = entry.id.trim();
    if id.starts_with("http://") || id.starts_with("https://") {
        return id.to_string();
    }
    String::new()
}

const NON_IMAGE_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "aac", "ogg", "oga", "wav", "flac", "mp4", "m4v", "mov", "webm", "mkv", "avi",
];

/// media:content with an image type first, then untyped media:content that
/// does not look like audio or video, then media:thumbnail.
fn select_media_image(entry: &Entry) -> Option<String> {
    let contents: Vec<_> = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|c| {
            let url = c.url.as_ref()?.as_str().trim();
            (!url.is_empty()).then_some((url, c.content_type.as_ref()))
        })
        .collect();

    let typed = contents
        .iter()
        .find(|(_, mime)| mime.map(|m| m.type_().as_str() == "image").unwrap_or(false))
        .map(|(url, _)| url.to_string());
    let untyped = || {
        contents
            .iter()
            .find(|(url, mime)| mime.is_none() && !looks_like_audio_or_video(url))
            .map(|(url, _)| url.to_string())
    };

    typed.or_else(untyped).or_else(|| {
        entry
            .media
            .iter()
            .flat_map(|m| m.thumbnails.iter())
            .map(|t| t.image.uri.trim())
            .find(|uri| !uri.is_empty())
            .map(str::to_string)
    })
}

fn looks_like_audio_or_video(url: &str) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    path.rsplit_once('.')
        .map(|(_, ext)| NON_IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn select_attachment_image(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|link| {
            let rel_enclosure = link
                .rel
                .as_deref()
                .map(|r| r.eq_ignore_ascii_case("enclosure"))
                .unwrap_or(false);
            let image_type = link
                .media_type
                .as_deref()
                .map(|t| t.starts_with("image/"))
                .unwrap_or(false);
            !link.href.trim().is_empty() && (image_type || (rel_enclosure && link.media_type.is_none()))
        })
        .map(|link| link.href.trim().to_string())
}

/// First `<img src>` in the body HTML, resolved against the article URL.
fn select_inline_image(body: &str, article_url: &str) -> Option<String> {
    if !body.contains("<img") {
        return None;
    }
    let selector = Selector::parse("img[src]").ok()?;
    let fragment = Html::parse_fragment(body);
    let src = fragment
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())?
        .to_string();

    match Url::parse(&src) {
        Ok(absolute) => Some(absolute.to_string()),
        Err(_) => Url::parse(article_url)
            .and_then(|base| base.join(&src))
            .map(|u| u.to_string())
            .ok(),
    }
}
