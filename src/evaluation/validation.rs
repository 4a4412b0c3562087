//! Submission text cleaning and validation.
//!
//! Text is cleaned first (XML-like tags stripped, whitespace trimmed) and
//! then checked against length bounds and blocked-content rules. Anything
//! that fails here is a [`GateError::Validation`] and never reaches a scorer.

use crate::config::LimitsConfig;
use crate::error::{GateError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("Valid tag regex"));

static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bhttps?://\S+").expect("Valid URL regex"));

static EMAIL_IN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("Valid embedded e-mail regex")
});

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Valid e-mail regex")
});

/// Longest allowed run of one repeated character
const MAX_CHAR_RUN: usize = 10;

/// Strip XML-like tags and surrounding whitespace
pub fn clean_text(raw: &str) -> String {
    TAG.replace_all(raw, "").trim().to_string()
}

/// First e-mail address mentioned in free text, if any
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_IN_TEXT.find(text).map(|m| m.as_str().to_string())
}

/// Whether `address` looks like a deliverable e-mail address
pub fn is_valid_email(address: &str) -> bool {
    EMAIL.is_match(address.trim())
}

/// Length bounds and blocked-content rules
#[derive(Debug, Clone)]
pub struct TextPolicy {
    min_chars: usize,
    max_chars: usize,
    blocked: Option<Regex>,
    spam_protection: bool,
}

impl TextPolicy {
    pub fn new(
        min_chars: usize,
        max_chars: usize,
        blocked_words: &[String],
        spam_protection: bool,
    ) -> Result<Self> {
        let words: Vec<String> = blocked_words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();

        let blocked = if words.is_empty() {
            None
        } else {
            let pattern = format!(r"(?i)\b(?:{})\b", words.join("|"));
            Some(Regex::new(&pattern).map_err(|e| GateError::Other(e.to_string()))?)
        };

        Ok(Self {
            min_chars,
            max_chars,
            blocked,
            spam_protection,
        })
    }

    pub fn from_limits(limits: &LimitsConfig) -> Result<Self> {
        Self::new(
            limits.min_text_length,
            limits.max_text_length,
            &limits.blocked_words,
            limits.spam_protection,
        )
    }

    /// Clean `raw` and check it; returns the cleaned text
    pub fn validate(&self, raw: &str) -> Result<String> {
        let text = clean_text(raw);
        let len = text.chars().count();

        if len == 0 {
            return Err(GateError::Validation("text cannot be empty".into()));
        }
        if len < self.min_chars {
            return Err(GateError::Validation(format!(
                "text is too short ({} characters, minimum {})",
                len, self.min_chars
            )));
        }
        if len > self.max_chars {
            return Err(GateError::Validation(format!(
                "text is too long ({} characters, maximum {})",
                len, self.max_chars
            )));
        }

        if let Some(blocked) = &self.blocked {
            if let Some(m) = blocked.find(&text) {
                return Err(GateError::Validation(format!(
                    "blocked content: '{}'",
                    m.as_str()
                )));
            }
        }

        if self.spam_protection {
            if URL.is_match(&text) {
                return Err(GateError::Validation("blocked content: links are not allowed".into()));
            }
            if longest_char_run(&text) > MAX_CHAR_RUN {
                return Err(GateError::Validation(
                    "blocked content: repeated characters".into(),
                ));
            }
        }

        Ok(text)
    }
}

fn longest_char_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut prev = None;
    for c in text.chars() {
        if Some(c) == prev {
            current += 1;
        } else {
            current = 1;
            prev = Some(c);
        }
        longest = longest.max(current);
    }
    longest
}
