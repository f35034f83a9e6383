//! # Triage Module
//!
//! Classification and ranking of civic feedback.
//! Runs the hosted model when one is configured and falls back to
//! deterministic keyword rules whenever it is absent or misbehaves.
//!
//! ## Components
//! - `category`: keyword category classifier
//! - `severity`: keyword severity cascade
//! - `spam`: surface-signal spam heuristic
//! - `priority`: priority score formula
//! - `drafting`: citizen responses and action plans
//! - `summary`: weekly summaries and insights
//! - `parse`: JSON extraction from model replies
//! - `classifier`: the classifier strategy (model / keyword)
//! - `analyzer`: orchestrator with fallback

pub mod analyzer;
pub mod category;
pub mod classifier;
pub mod drafting;
pub mod parse;
pub mod priority;
pub mod severity;
pub mod spam;
pub mod summary;

use serde::{Deserialize, Serialize};

pub use analyzer::{FeedbackItem, TriageAnalyzer, TriageReport};
pub use category::{classify_category, Category, CategoryClassifier, ClassificationResult};
pub use classifier::{KeywordClassifier, ModelClassifier, TriageClassifier};
pub use priority::{
    compute_priority, compute_priority_from_labels, PriorityBreakdown, PriorityInput,
    PriorityScorer,
};
pub use severity::{classify_severity, Severity, SeverityClassifier, SeverityResult};
pub use spam::{detect_spam, spam_score, SpamResult, SPAM_THRESHOLD};

/// Confidence reported by the keyword fallbacks
pub const FALLBACK_CONFIDENCE: f32 = 0.6;

/// Where a classification came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierSource {
    /// Chosen by the citizen or an administrator
    Submitter,
    /// Hosted language model
    Model,
    /// Keyword fallback
    Keyword,
}

pub(crate) fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// The text every classifier sees for a report.
pub fn feedback_text(title: &str, description: &str) -> String {
    format!("Title: {title}\nDescription: {description}")
}
