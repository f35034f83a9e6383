//! Surface-signal spam heuristic.

use serde::{Deserialize, Serialize};

use super::ClassifierSource;

/// Scores strictly above this are treated as spam.
pub const SPAM_THRESHOLD: f64 = 0.7;

const SHORT_TEXT_CHARS: usize = 10;
const MAX_EXCLAMATIONS: usize = 3;
const SPAM_WORDS: &[&str] = &["free", "money", "win", "click", "buy"];

const SHORT_TEXT_WEIGHT: f64 = 0.3;
const EXCLAMATION_WEIGHT: f64 = 0.2;
const SPAM_WORD_WEIGHT: f64 = 0.4;
const SHOUTING_WEIGHT: f64 = 0.2;

/// Outcome of spam screening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamResult {
    /// 0.0 (definitely legitimate) to 1.0 (definitely spam)
    pub spam_score: f64,
    pub is_spam: bool,
    pub reasoning: String,
    pub source: ClassifierSource,
}

impl SpamResult {
    /// Clamps the score into [0, 1] and derives `is_spam` from [`SPAM_THRESHOLD`].
    pub fn new(spam_score: f64, reasoning: impl Into<String>, source: ClassifierSource) -> Self {
        let spam_score = if spam_score.is_finite() {
            spam_score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            spam_score,
            is_spam: spam_score > SPAM_THRESHOLD,
            reasoning: reasoning.into(),
            source,
        }
    }
}

/// A signal that contributed to the spam score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamSignal {
    ShortText,
    ExcessiveExclamation,
    PromotionalWords,
    AllCaps,
}

impl SpamSignal {
    fn weight(&self) -> f64 {
        match self {
            SpamSignal::ShortText => SHORT_TEXT_WEIGHT,
            SpamSignal::ExcessiveExclamation => EXCLAMATION_WEIGHT,
            SpamSignal::PromotionalWords => SPAM_WORD_WEIGHT,
            SpamSignal::AllCaps => SHOUTING_WEIGHT,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            SpamSignal::ShortText => "very short text",
            SpamSignal::ExcessiveExclamation => "excessive exclamation marks",
            SpamSignal::PromotionalWords => "promotional wording",
            SpamSignal::AllCaps => "written entirely in capitals",
        }
    }
}

/// True when the text has at least one cased character and none in lower case.
fn is_all_caps(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Signals present in `text`, in scoring order.
pub fn spam_signals(text: &str) -> Vec<SpamSignal> {
    let mut signals = Vec::new();
    let text_lower = text.to_lowercase();

    if text.chars().count() < SHORT_TEXT_CHARS {
        signals.push(SpamSignal::ShortText);
    }
    if text.chars().filter(|c| *c == '!').count() > MAX_EXCLAMATIONS {
        signals.push(SpamSignal::ExcessiveExclamation);
    }
    if SPAM_WORDS.iter().any(|w| text_lower.contains(w)) {
        signals.push(SpamSignal::PromotionalWords);
    }
    if is_all_caps(text) {
        signals.push(SpamSignal::AllCaps);
    }

    signals
}

/// Additive heuristic score, capped at 1.0. Does not apply the threshold.
pub fn spam_score(text: &str) -> f64 {
    let total: f64 = spam_signals(text).iter().map(SpamSignal::weight).sum();
    total.min(1.0)
}

/// Screen text with the heuristic and explain which signals fired.
pub fn detect_spam(text: &str) -> SpamResult {
    let signals = spam_signals(text);
    let score: f64 = signals.iter().map(SpamSignal::weight).sum();

    let reasoning = if signals.is_empty() {
        "Fallback analysis: no spam signals".to_string()
    } else {
        let described: Vec<&str> = signals.iter().map(SpamSignal::describe).collect();
        format!("Fallback analysis: {}", described.join(", "))
    };

    SpamResult::new(score.min(1.0), reasoning, ClassifierSource::Keyword)
}
