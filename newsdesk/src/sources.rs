use common::SourceConfig;
use tracing::warn;

use crate::model::{SourceDescriptor, Topic};

/// Built-in feeds used when the configuration lists none.
/// Section feeds such as "top" or "india" carry no topic hint.
pub fn default_sources() -> Vec<SourceDescriptor> {
    [
        ("Times of India", "https://timesofindia.indiatimes.com/rssfeedstopstories.cms", None),
        ("Times of India", "https://timesofindia.indiatimes.com/rssfeeds/4719161.cms", None),
        ("Times of India", "https://timesofindia.indiatimes.com/rssfeeds/4719148.cms", Some(Topic::Business)),
        ("Times of India", "https://timesofindia.indiatimes.com/rssfeeds/4719162.cms", Some(Topic::Sports)),
        ("The Hindu", "https://www.thehindu.com/news/feeder/default.rss", None),
        ("The Hindu", "https://www.thehindu.com/business/feeder/default.rss", Some(Topic::Business)),
        ("The Hindu", "https://www.thehindu.com/sport/feeder/default.rss", Some(Topic::Sports)),
        ("Hindustan Times", "https://www.hindustantimes.com/feeds/rss/india-news/rssfeed.xml", None),
        ("Hindustan Times", "https://www.hindustantimes.com/feeds/rss/business/rssfeed.xml", Some(Topic::Business)),
        ("Hindustan Times", "https://www.hindustantimes.com/feeds/rss/sports/rssfeed.xml", Some(Topic::Sports)),
    ]
    .into_iter()
    .map(|(name, url, hint)| SourceDescriptor::new(name, url, hint))
    .collect()
}

/// Converts configured sources; an empty list falls back to [`default_sources`].
pub fn from_config(configured: &[SourceConfig]) -> Vec<SourceDescriptor> {
    if configured.is_empty() {
        return default_sources();
    }
    configured
        .iter()
        .map(|s| {
            let hint = s.topic.as_deref().and_then(|name| {
                let topic = Topic::parse(name);
                if topic.is_none() {
                    warn!(source = %s.name, topic = %name, "unknown topic hint ignored");
                }
                topic
            });
            SourceDescriptor::new(s.name.clone(), s.url.clone(), hint)
        })
        .collect()
}
