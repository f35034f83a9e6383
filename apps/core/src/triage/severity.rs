//! Severity detection using urgency keyword tiers.
//!
//! High-tier keywords take strict precedence over medium-tier ones; the two
//! lists are never compared by count.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ClassifierSource, FALLBACK_CONFIDENCE};

/// Urgency tier of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn label(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    /// Parses a canonical label, returning `None` for anything else.
    pub fn parse_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label.trim())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown severity: {s}"))
    }
}

const HIGH_KEYWORDS: &[&str] = &[
    "emergency",
    "urgent",
    "immediate",
    "danger",
    "critical",
    "broken",
    "not working",
    "flooding",
    "fire",
];

const MEDIUM_KEYWORDS: &[&str] = &[
    "problem",
    "issue",
    "concern",
    "repair",
    "damaged",
    "inconvenience",
    "affecting",
];

/// Result of severity detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityResult {
    pub severity: Severity,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    pub source: ClassifierSource,
    pub matched_keywords: Vec<String>,
}

impl SeverityResult {
    pub fn new(severity: Severity, confidence: f32, source: ClassifierSource) -> Self {
        Self {
            severity,
            confidence: super::clamp_confidence(confidence),
            source,
            matched_keywords: Vec::new(),
        }
    }
}

/// Keyword cascade severity classifier
#[derive(Debug, Default, Clone, Copy)]
pub struct SeverityClassifier;

impl SeverityClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> SeverityResult {
        let text_lower = text.to_lowercase();

        let hits = |keywords: &[&str]| -> Vec<String> {
            keywords
                .iter()
                .filter(|k| text_lower.contains(*k))
                .map(|k| k.to_string())
                .collect()
        };

        let high = hits(HIGH_KEYWORDS);
        let (severity, matched_keywords) = if !high.is_empty() {
            (Severity::High, high)
        } else {
            let medium = hits(MEDIUM_KEYWORDS);
            if !medium.is_empty() {
                (Severity::Medium, medium)
            } else {
                (Severity::Low, Vec::new())
            }
        };

        SeverityResult {
            severity,
            confidence: FALLBACK_CONFIDENCE,
            source: ClassifierSource::Keyword,
            matched_keywords,
        }
    }
}

/// Detect severity with the keyword fallback.
pub fn classify_severity(text: &str) -> SeverityResult {
    SeverityClassifier::new().classify(text)
}
