//! Keyword-based feedback classification.
//!
//! Tags each accepted submission with a sentiment, a category and a handful
//! of keywords so organisers can see what people talk about. Matching is
//! case-insensitive substring matching, like the heuristic scorer.

use crate::types::{Category, Sentiment};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z]{3,}\b").expect("Valid keyword regex"));

const POSITIVE_WORDS: &[&str] = &[
    "excited",
    "amazing",
    "great",
    "awesome",
    "love",
    "fantastic",
    "excellent",
    "wonderful",
    "perfect",
    "brilliant",
    "outstanding",
    "looking forward",
    "can't wait",
    "thrilled",
    "pumped",
];

const NEGATIVE_WORDS: &[&str] = &[
    "worried",
    "concerned",
    "disappointed",
    "bad",
    "terrible",
    "awful",
    "hate",
    "horrible",
    "poor",
    "lacking",
    "insufficient",
    "frustrated",
    "annoyed",
    "upset",
    "anxious",
];

/// Ties go to the category listed first
const CATEGORY_WORDS: &[(Category, &[&str])] = &[
    (
        Category::Expectations,
        &[
            "expect",
            "hope",
            "goal",
            "want",
            "wish",
            "looking for",
            "achieve",
            "learn",
            "skill",
            "experience",
            "outcome",
        ],
    ),
    (
        Category::Logistics,
        &[
            "venue",
            "location",
            "food",
            "accommodation",
            "parking",
            "schedule",
            "timing",
            "registration",
            "check-in",
            "wifi",
        ],
    ),
    (
        Category::Technical,
        &[
            "api",
            "tools",
            "platform",
            "software",
            "hardware",
            "infrastructure",
            "development",
            "coding",
            "programming",
        ],
    ),
    (
        Category::Networking,
        &[
            "network",
            "meet",
            "connect",
            "team",
            "collaborate",
            "mentorship",
            "mentor",
            "partner",
            "social",
            "community",
        ],
    ),
    (
        Category::Learning,
        &[
            "workshop",
            "tutorial",
            "session",
            "presentation",
            "talk",
            "education",
            "training",
            "skill",
            "knowledge",
            "course",
        ],
    ),
];

const STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "with", "are", "was", "were", "have", "has", "had", "does", "did",
    "will", "would", "could", "should", "may", "might", "can", "you", "she", "they", "this",
    "that", "these", "those",
];

/// Most keywords kept per submission
pub const MAX_KEYWORDS: usize = 10;

/// Sentiment, category and keywords of one submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub sentiment: Sentiment,
    pub category: Category,
    pub keywords: Vec<String>,
}

/// Tag `text` with sentiment, category and keywords
pub fn classify(text: &str) -> Classification {
    Classification {
        sentiment: sentiment_of(text),
        category: category_of(text),
        keywords: extract_keywords(text),
    }
}

/// Positive or negative when one vocabulary outweighs the other
pub fn sentiment_of(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let positive = count_matches(&lower, POSITIVE_WORDS);
    let negative = count_matches(&lower, NEGATIVE_WORDS);
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// Category with the most matching words, `General` when nothing matches
pub fn category_of(text: &str) -> Category {
    let lower = text.to_lowercase();
    let mut best = (Category::General, 0);
    for (category, words) in CATEGORY_WORDS {
        let hits = count_matches(&lower, words);
        if hits > best.1 {
            best = (*category, hits);
        }
    }
    best.0
}

/// Distinct words of three or more letters, minus stop words, in order of
/// first appearance
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .take(MAX_KEYWORDS)
        .collect()
}

fn count_matches(haystack: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| haystack.contains(*w)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment() {
        assert_eq!(
            sentiment_of("Amazing food, I love this place"),
            Sentiment::Positive
        );
        assert_eq!(
            sentiment_of("The wifi was terrible and I was frustrated"),
            Sentiment::Negative
        );
        assert_eq!(sentiment_of("It was a Tuesday"), Sentiment::Neutral);
        // One of each cancels out
        assert_eq!(sentiment_of("great pizza, awful queue"), Sentiment::Neutral);
    }

    #[test]
    fn test_category_picks_most_matches() {
        assert_eq!(
            category_of("The venue had no parking and the food ran out"),
            Category::Logistics
        );
        assert_eq!(
            category_of("Met my team and a mentor from the community"),
            Category::Networking
        );
        assert_eq!(category_of("Pizza night was the best!"), Category::General);
    }

    #[test]
    fn test_category_ties_go_to_first_listed() {
        // "skill" counts for both expectations and learning
        assert_eq!(category_of("mostly about skill"), Category::Expectations);
    }

    #[test]
    fn test_keywords_are_distinct_and_capped() {
        let keywords = extract_keywords("the pizza and the PIZZA crust was hot, so hot");
        assert_eq!(keywords, vec!["pizza", "crust", "hot"]);

        let long = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo lima";
        assert_eq!(extract_keywords(long).len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_classify() {
        let c = classify("Thrilled with the workshop and the tutorial session!");
        assert_eq!(c.sentiment, Sentiment::Positive);
        assert_eq!(c.category, Category::Learning);
        assert_eq!(c.keywords[0], "thrilled");
    }
}
