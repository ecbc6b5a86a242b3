use common::ClassifierConfig;
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

use crate::model::Topic;

const SENTIMENT_STEP: f64 = 0.1;
const SUMMARY_SENTENCES: usize = 3;
const SUMMARY_MAX_CHARS: usize = 300;

/// Lookup tables driving every heuristic. Topic order is the tie-break:
/// the first topic with a matching keyword wins.
#[derive(Debug, Clone)]
pub struct ClassifierTables {
    pub topics: Vec<(Topic, Vec<String>)>,
    pub gazetteer: Vec<String>,
    pub stop_words: HashSet<String>,
    pub positive_words: HashSet<String>,
    pub negative_words: HashSet<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn lowered_set<I, S>(words: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

impl Default for ClassifierTables {
    fn default() -> Self {
        let topics = vec![
            (
                Topic::Politics,
                owned(&["election", "minister", "government", "party", "congress", "bjp", "opposition", "parliament", "assembly"]),
            ),
            (
                Topic::Business,
                owned(&["economy", "market", "stock", "trade", "business", "company", "industry", "finance"]),
            ),
            (
                Topic::Sports,
                owned(&["cricket", "football", "match", "tournament", "player", "team", "sport", "game"]),
            ),
            (
                Topic::Technology,
                owned(&["tech", "digital", "internet", "mobile", "app", "software", "computer", "ai", "artificial intelligence"]),
            ),
            (
                Topic::Agriculture,
                owned(&["farmer", "crop", "agriculture", "farm", "rural", "village", "kisan"]),
            ),
            (
                Topic::Entertainment,
                owned(&["movie", "film", "actor", "actress", "bollywood", "hollywood", "celebrity", "star"]),
            ),
            (
                Topic::Environment,
                owned(&["climate", "environment", "pollution", "forest", "wildlife", "green", "eco"]),
            ),
            (
                Topic::Healthcare,
                owned(&["health", "medical", "hospital", "doctor", "disease", "treatment", "medicine"]),
            ),
        ];

        let gazetteer = owned(&[
            "Andhra Pradesh", "Arunachal Pradesh", "Assam", "Bihar", "Chhattisgarh",
            "Delhi", "Goa", "Gujarat", "Haryana", "Himachal Pradesh", "Jammu and Kashmir",
            "Jharkhand", "Karnataka", "Kerala", "Ladakh", "Lakshadweep", "Madhya Pradesh",
            "Maharashtra", "Manipur", "Meghalaya", "Mizoram", "Nagaland", "Odisha",
            "Puducherry", "Punjab", "Rajasthan", "Sikkim", "Tamil Nadu", "Telangana",
            "Tripura", "Uttar Pradesh", "Uttarakhand", "West Bengal",
        ]);

        Self {
            topics,
            gazetteer,
            stop_words: lowered_set([
                "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "new",
            ]),
            positive_words: lowered_set(["good", "great", "excellent", "positive", "success", "win", "happy", "better"]),
            negative_words: lowered_set(["bad", "poor", "negative", "failure", "lose", "unhappy", "worse", "problem"]),
        }
    }
}

impl ClassifierTables {
    /// Built-in tables with every table present in `config` replaced.
    pub fn from_config(config: Option<&ClassifierConfig>) -> Self {
        let mut tables = Self::default();
        let Some(config) = config else { return tables };

        if let Some(topics) = &config.topics {
            tables.topics = topics
                .iter()
                .filter_map(|entry| match Topic::parse(&entry.topic) {
                    Some(topic) => Some((topic, entry.keywords.clone())),
                    None => {
                        warn!(topic = %entry.topic, "ignoring classifier entry for unknown topic");
                        None
                    }
                })
                .collect();
        }
        if let Some(gazetteer) = &config.gazetteer {
            tables.gazetteer = gazetteer
                .iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
        }
        if let Some(words) = &config.stop_words {
            tables.stop_words = lowered_set(words);
        }
        if let Some(words) = &config.positive_words {
            tables.positive_words = lowered_set(words);
        }
        if let Some(words) = &config.negative_words {
            tables.negative_words = lowered_set(words);
        }
        tables
    }
}

/// Everything the extractor derives from one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub topic: Topic,
    pub key_entities: Vec<String>,
    pub affected_states: Vec<String>,
    pub sentiment_score: f64,
    pub summary: String,
}

/// Deterministic text heuristics over normalized text.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    tables: ClassifierTables,
}

/// Whitespace tokens with surrounding punctuation removed.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|t| !t.is_empty())
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

impl Classifier {
    pub fn new(tables: ClassifierTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &ClassifierTables {
        &self.tables
    }

    /// Runs every extractor. Topic, entities and regions read title and
    /// body together; sentiment and summary read the body only.
    pub fn classify(&self, title: &str, body: &str) -> Metadata {
        let combined = format!("{} {}", title, body);
        Metadata {
            topic: self.classify_topic(&combined),
            key_entities: self.extract_entities(&combined),
            affected_states: self.extract_regions(&combined),
            sentiment_score: self.score_sentiment(body),
            summary: self.summarize(body),
        }
    }

    pub fn classify_topic(&self, text: &str) -> Topic {
        let lowered = text.to_lowercase();
        self.tables
            .topics
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .any(|k| !k.is_empty() && lowered.contains(&k))
            })
            .map(|(topic, _)| *topic)
            .unwrap_or(Topic::General)
    }

    /// Title-cased, deduplicated, lexicographically sorted.
    pub fn extract_entities(&self, text: &str) -> Vec<String> {
        let entities: BTreeSet<String> = tokens(text)
            .filter(|t| t.chars().count() > 2)
            .filter(|t| !self.tables.stop_words.contains(&t.to_lowercase()))
            .map(title_case)
            .collect();
        entities.into_iter().collect()
    }

    /// Matches in gazetteer table order.
    pub fn extract_regions(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut regions: Vec<String> = Vec::new();
        for region in &self.tables.gazetteer {
            if region.is_empty() || regions.contains(region) {
                continue;
            }
            if lowered.contains(&region.to_lowercase()) {
                regions.push(region.clone());
            }
        }
        regions
    }

    pub fn score_sentiment(&self, text: &str) -> f64 {
        let mut hits: i64 = 0;
        for token in tokens(text) {
            let token = token.to_lowercase();
            if self.tables.positive_words.contains(&token) {
                hits += 1;
            }
            if self.tables.negative_words.contains(&token) {
                hits -= 1;
            }
        }
        // Integer tally avoids accumulating float error from repeated 0.1 steps.
        (hits as f64 * SENTIMENT_STEP).clamp(-1.0, 1.0)
    }

    /// First three sentences joined with ". " plus a trailing period, cut at
    /// `SUMMARY_MAX_CHARS` characters before the period.
    pub fn summarize(&self, text: &str) -> String {
        let sentences: Vec<&str> = text
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(SUMMARY_SENTENCES)
            .collect();
        if sentences.is_empty() {
            return String::new();
        }
        let joined = sentences.join(". ");
        match joined.char_indices().nth(SUMMARY_MAX_CHARS) {
            Some((cut, _)) => format!("{}.", joined[..cut].trim_end()),
            None => format!("{}.", joined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::TopicKeywordsConfig;

    fn classifier() -> Classifier {
        Classifier::default()
    }

    #[test]
    fn farm_policy_story_is_agriculture_in_punjab() {
        let meta = classifier().classify("New Agricultural Policy", "Farmers in Punjab celebrate new policy");
        assert_eq!(meta.topic, Topic::Agriculture);
        assert!(meta.affected_states.contains(&"Punjab".to_string()));
        assert!(meta.key_entities.contains(&"Farmers".to_string()));
        assert!(meta.key_entities.contains(&"Policy".to_string()));
        assert!(!meta.key_entities.contains(&"New".to_string()));
        assert!(!meta.key_entities.contains(&"In".to_string()));
    }

    #[test]
    fn topic_table_order_breaks_ties() {
        // "election" (politics) and "market" (business) both match; politics is listed first.
        let c = classifier();
        assert_eq!(c.classify_topic("Market rallies after election results"), Topic::Politics);
        assert_eq!(c.classify_topic("Nothing to see here"), Topic::General);
    }

    #[test]
    fn topic_is_deterministic() {
        let c = classifier();
        let text = "Cricket team wins the tournament in Kerala";
        let first = c.classify_topic(text);
        for _ in 0..50 {
            assert_eq!(c.classify_topic(text), first);
        }
    }

    #[test]
    fn entities_are_sorted_and_deduplicated() {
        let entities = classifier().extract_entities("delhi Delhi DELHI, rain. Of by it monsoon");
        assert_eq!(entities, vec!["Delhi", "Monsoon", "Rain"]);
    }

    #[test]
    fn regions_follow_gazetteer_order() {
        let regions = classifier().extract_regions("Rain lashes west bengal and Assam; Assam worst hit");
        assert_eq!(regions, vec!["Assam", "West Bengal"]);
    }

    #[test]
    fn sentiment_counts_and_clamps() {
        let c = classifier();
        assert_eq!(c.score_sentiment(""), 0.0);
        assert!((c.score_sentiment("good great, bad") - 0.1).abs() < 1e-9);
        let gushing = "excellent ".repeat(40);
        assert_eq!(c.score_sentiment(&gushing), 1.0);
        let grim = "problem ".repeat(40);
        assert_eq!(c.score_sentiment(&grim), -1.0);
    }

    #[test]
    fn sentiment_stays_in_range_for_mixed_input() {
        let c = classifier();
        let samples = [
            "good bad good bad good",
            "win win win win win win win win win win win win lose",
            "!!! ??? ... \u{1F600} ünïcödé",
            "poor poor poor poor poor poor poor poor poor poor poor poor poor",
        ];
        for text in samples {
            let score = c.score_sentiment(text);
            assert!((-1.0..=1.0).contains(&score), "{} out of range for {:?}", score, text);
        }
    }

    #[test]
    fn summary_takes_three_sentences() {
        let c = classifier();
        assert_eq!(c.summarize("One. Two! Three? Four."), "One. Two. Three.");
        assert_eq!(c.summarize("Only one sentence"), "Only one sentence.");
        assert_eq!(c.summarize("First... second"), "First. second.");
        assert_eq!(c.summarize(""), "");
    }

    #[test]
    fn summary_is_bounded_without_terminators() {
        let c = classifier();
        let body = "farmers gather near the mandi ".repeat(40);
        let summary = c.summarize(&body);
        assert!(summary.chars().count() <= SUMMARY_MAX_CHARS + 1);
        assert!(summary.chars().count() > SUMMARY_MAX_CHARS - 30);
        assert!(body.starts_with(summary.trim_end_matches('.')));
        assert!(summary.ends_with('.'));

        let accented = "é".repeat(SUMMARY_MAX_CHARS * 2);
        assert_eq!(c.summarize(&accented).chars().count(), SUMMARY_MAX_CHARS + 1);
    }

    #[test]
    fn config_overrides_replace_tables() {
        let config = ClassifierConfig {
            topics: Some(vec![
                TopicKeywordsConfig { topic: "sports".into(), keywords: vec!["policy".into()] },
                TopicKeywordsConfig { topic: "weather".into(), keywords: vec!["rain".into()] },
            ]),
            gazetteer: Some(vec!["Kerala".into()]),
            stop_words: None,
            positive_words: Some(vec!["Celebrate".into()]),
            negative_words: None,
        };
        let c = Classifier::new(ClassifierTables::from_config(Some(&config)));
        assert_eq!(c.tables().topics.len(), 1);
        assert_eq!(c.classify_topic("new policy"), Topic::Sports);
        assert_eq!(c.extract_regions("Punjab and Kerala"), vec!["Kerala"]);
        assert!((c.score_sentiment("farmers celebrate") - 0.1).abs() < 1e-9);
    }
}
