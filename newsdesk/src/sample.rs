use chrono::{Duration, Utc};

use crate::model::{Article, Topic};

struct SampleEntry {
    title: &'static str,
    slug: &'static str,
    source: &'static str,
    topic: Topic,
    summary: &'static str,
    sentiment: f64,
    entities: &'static [&'static str],
    states: &'static [&'static str],
}

const SAMPLES: &[SampleEntry] = &[
    SampleEntry {
        title: "India's Economic Growth",
        slug: "india-economy",
        source: "Times of India",
        topic: Topic::Business,
        summary: "India's economy shows strong growth in the latest quarter, driven by manufacturing and services sectors.",
        sentiment: 0.8,
        entities: &["Economy", "India", "Manufacturing"],
        states: &["Gujarat", "Maharashtra"],
    },
    SampleEntry {
        title: "Cricket World Cup 2024",
        slug: "cricket",
        source: "The Hindu",
        topic: Topic::Sports,
        summary: "India prepares for the upcoming Cricket World Cup with high hopes and strong team selection.",
        sentiment: 0.6,
        entities: &["Cricket", "India", "World Cup"],
        states: &["Delhi", "Maharashtra"],
    },
    SampleEntry {
        title: "Technology Innovation in India",
        slug: "tech",
        source: "Hindustan Times",
        topic: Topic::Technology,
        summary: "Indian tech startups are making waves globally with innovative solutions in AI and blockchain.",
        sentiment: 0.7,
        entities: &["AI", "Startups", "Technology"],
        states: &["Karnataka", "Telangana"],
    },
    SampleEntry {
        title: "New Agricultural Policy",
        slug: "agriculture",
        source: "Times of India",
        topic: Topic::Agriculture,
        summary: "Government announces new agricultural policy focusing on sustainable farming and farmer welfare.",
        sentiment: 0.5,
        entities: &["Agriculture", "Farmers", "Policy"],
        states: &["Haryana", "Punjab", "Uttar Pradesh"],
    },
    SampleEntry {
        title: "Bollywood's Latest Blockbuster",
        slug: "entertainment",
        source: "The Hindu",
        topic: Topic::Entertainment,
        summary: "New Bollywood movie breaks box office records with stellar performances and innovative storytelling.",
        sentiment: 0.9,
        entities: &["Bollywood", "Box Office", "Movie"],
        states: &["Delhi", "Maharashtra"],
    },
    SampleEntry {
        title: "Political Reforms",
        slug: "politics",
        source: "Hindustan Times",
        topic: Topic::Politics,
        summary: "Major political reforms announced to improve transparency and accountability in governance.",
        sentiment: 0.4,
        entities: &["Government", "Politics", "Reforms"],
        states: &["Delhi", "Uttar Pradesh"],
    },
    SampleEntry {
        title: "Environmental Initiatives",
        slug: "environment",
        source: "Times of India",
        topic: Topic::Environment,
        summary: "New environmental policies introduced to combat climate change and promote sustainable development.",
        sentiment: 0.7,
        entities: &["Climate", "Environment", "Policy"],
        states: &["Himachal Pradesh", "Kerala"],
    },
    SampleEntry {
        title: "Digital Transformation",
        slug: "digital",
        source: "The Hindu",
        topic: Topic::Technology,
        summary: "India's digital transformation accelerates with new initiatives in e-governance and digital payments.",
        sentiment: 0.8,
        entities: &["Digital", "Innovation", "Technology"],
        states: &["Andhra Pradesh", "Karnataka"],
    },
    SampleEntry {
        title: "Sports Infrastructure",
        slug: "sports",
        source: "Hindustan Times",
        topic: Topic::Sports,
        summary: "Major investment in sports infrastructure to promote athletics and develop future champions.",
        sentiment: 0.6,
        entities: &["Infrastructure", "Investment", "Sports"],
        states: &["Gujarat", "Maharashtra"],
    },
    SampleEntry {
        title: "Healthcare Reforms",
        slug: "healthcare",
        source: "Times of India",
        topic: Topic::Healthcare,
        summary: "New healthcare reforms announced to improve medical services and make healthcare more accessible.",
        sentiment: 0.7,
        entities: &["Healthcare", "Medical", "Reforms"],
        states: &["Delhi", "Tamil Nadu"],
    },
];

/// The fixed demonstration set, newest first, one hour apart.
pub fn sample_articles() -> Vec<Article> {
    let now = Utc::now();
    SAMPLES
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let url = format!("https://example.com/{}", entry.slug);
            let mut article = Article::new(entry.title, url, entry.source);
            article.topic = entry.topic;
            article.summary = entry.summary.to_string();
            article.sentiment_score = entry.sentiment;
            article.key_entities = entry.entities.iter().map(|e| e.to_string()).collect();
            article.affected_states = entry.states.iter().map(|s| s.to_string()).collect();
            article.image_url = format!("https://example.com/images/{}.jpg", entry.slug);
            article.published_at = now - Duration::hours(i as i64);
            article.created_at = now;
            article
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ten_unique_urls() {
        let articles = sample_articles();
        assert_eq!(articles.len(), 10);
        let urls: HashSet<&str> = articles.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls.len(), 10);
    }

    #[test]
    fn sample_states_are_in_the_gazetteer() {
        let gazetteer = crate::classify::ClassifierTables::default().gazetteer;
        for article in sample_articles() {
            for state in &article.affected_states {
                assert!(gazetteer.contains(state), "{} not in gazetteer", state);
            }
        }
    }
}
