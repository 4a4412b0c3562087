//! Local rule-based scorer used whenever the remote scorer is unavailable.
//!
//! Starts from a base score and adds bonuses for length, topic relevance,
//! creative vocabulary, emotional vocabulary and sentence structure. Word
//! matches are case-insensitive substring matches; each listed word counts
//! once no matter how often it appears.

use crate::types::{Evaluation, EvaluationSource};

/// Topic vocabulary used when none is configured
pub const DEFAULT_TOPIC_WORDS: &[&str] = &[
    "pizza",
    "cheese",
    "pepperoni",
    "crust",
    "slice",
    "topping",
    "sauce",
];

const CREATIVE_WORDS: &[&str] = &[
    "amazing",
    "incredible",
    "adventure",
    "story",
    "funny",
    "crazy",
    "epic",
];

const EMOTION_WORDS: &[&str] = &[
    "love",
    "hate",
    "happy",
    "sad",
    "excited",
    "disappointed",
    "surprised",
];

const BASE_SCORE: u8 = 3;
const MIN_SCORE: u8 = 1;
const MAX_SCORE: u8 = 10;

/// Deterministic keyword/length scorer
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    topic_words: Vec<String>,
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_WORDS.iter().map(|w| w.to_string()).collect())
    }
}

impl HeuristicScorer {
    pub fn new(topic_words: Vec<String>) -> Self {
        let topic_words = topic_words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { topic_words }
    }

    /// Score `text` within 1..=10
    pub fn score(&self, text: &str) -> Evaluation {
        let trimmed = text.trim();
        if trimmed.chars().count() < 10 {
            return Evaluation {
                score: MIN_SCORE,
                rationale: "Too short to evaluate".to_string(),
                source: EvaluationSource::Fallback,
            };
        }

        let lower = trimmed.to_lowercase();
        let len = trimmed.chars().count();
        let mut score = BASE_SCORE;
        let mut notes = Vec::new();

        if len > 100 {
            score += 1;
            if len > 200 {
                score += 1;
            }
            notes.push("good length");
        }

        let topic = self
            .topic_words
            .iter()
            .filter(|w| lower.contains(w.as_str()))
            .count();
        if topic >= 2 {
            score += 1;
            if topic >= 4 {
                score += 1;
            }
            notes.push("on topic");
        }

        let creative = count_matches(&lower, CREATIVE_WORDS);
        if creative >= 1 {
            score += 1;
            if creative >= 3 {
                score += 1;
            }
            notes.push("creative");
        }

        if count_matches(&lower, EMOTION_WORDS) >= 1 {
            score += 1;
            notes.push("expressive");
        }

        let sentences = trimmed
            .chars()
            .filter(|c| matches!(c, '.' | '!' | '?'))
            .count();
        if sentences >= 2 {
            score += 1;
            notes.push("well structured");
        }

        let rationale = if notes.is_empty() {
            "Basic submission".to_string()
        } else {
            format!("Heuristic score: {}", notes.join(", "))
        };

        Evaluation {
            score: score.clamp(MIN_SCORE, MAX_SCORE),
            rationale,
            source: EvaluationSource::Fallback,
        }
    }
}

fn count_matches(haystack: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| haystack.contains(*w)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_text_scores_minimum() {
        let eval = HeuristicScorer::default().score("  tiny  ");
        assert_eq!(eval.score, 1);
        assert_eq!(eval.source, EvaluationSource::Fallback);
    }

    #[test]
    fn test_plain_text_gets_base_score() {
        let eval = HeuristicScorer::default().score("the conference was fine overall");
        assert_eq!(eval.score, 3);
        assert_eq!(eval.rationale, "Basic submission");
    }

    #[test]
    fn test_bonuses_accumulate() {
        // topic x2 (+1), creative x1 (+1), emotion (+1), two sentences (+1)
        let eval = HeuristicScorer::default()
            .score("I love pizza with extra cheese. It was an epic night!");
        assert_eq!(eval.score, 7);
        assert!(eval.rationale.contains("on topic"));
    }

    #[test]
    fn test_rich_story_is_capped() {
        let story = "An epic, crazy and amazing adventure story! I was so excited and happy. \
                     The pizza had the best crust, pepperoni, cheese and sauce on every slice. \
                     Honestly the topping selection surprised everyone in the room that night. \
                     Would do it again?";
        let eval = HeuristicScorer::default().score(story);
        assert_eq!(eval.score, 10);
    }

    #[test]
    fn test_custom_topic_words() {
        let scorer = HeuristicScorer::new(vec!["Rust".into(), "borrow".into()]);
        let eval = scorer.score("rust and the borrow checker, all day long");
        assert_eq!(eval.score, 4);
    }

    proptest! {
        #[test]
        fn prop_score_in_range(text in ".{0,400}") {
            let eval = HeuristicScorer::default().score(&text);
            prop_assert!((1..=10).contains(&eval.score));
        }
    }
}
