//! Priority Scoring.
//!
//! Ranks reports for administrative attention. The score combines severity,
//! category, urgent wording, how often the location was reported and a small
//! dampening for very prolific submitters.

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::severity::Severity;

/// Base score when severity is unset or unrecognised
pub const UNKNOWN_SEVERITY_BASE: f64 = 0.3;
/// Multiplier when category is unset or unrecognised
pub const UNKNOWN_CATEGORY_MULTIPLIER: f64 = 1.0;

const URGENT_KEYWORDS: &[&str] = &[
    "emergency",
    "urgent",
    "immediate",
    "dangerous",
    "broken",
    "not working",
    "flooding",
];
const URGENCY_STEP: f64 = 0.1;
const URGENCY_CAP: f64 = 0.3;

const LOCATION_STEP: f64 = 0.05;
const LOCATION_CAP: f64 = 0.2;

const HISTORY_THRESHOLD: u32 = 10;
const HISTORY_DAMPENING: f64 = 0.95;

impl Severity {
    pub fn base_score(&self) -> f64 {
        match self {
            Severity::High => 0.8,
            Severity::Medium => 0.5,
            Severity::Low => 0.2,
        }
    }
}

impl Category {
    pub fn priority_multiplier(&self) -> f64 {
        match self {
            Category::Safety => 1.2,
            Category::Water | Category::Electricity => 1.1,
            Category::Traffic => 1.0,
            Category::Sanitation => 0.9,
            Category::Infrastructure => 0.8,
            Category::Other => 0.7,
        }
    }
}

/// Inputs to the priority formula
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriorityInput {
    pub severity: Option<Severity>,
    pub category: Option<Category>,
    pub description: String,
    /// Number of earlier reports by the same submitter
    pub submitter_history: u32,
    /// Number of earlier reports at the same location
    pub location_frequency: u32,
}

/// Each term of the formula, kept for display to administrators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub base: f64,
    pub category_multiplier: f64,
    pub urgency_boost: f64,
    pub urgent_keywords: Vec<String>,
    pub location_factor: f64,
    pub history_dampened: bool,
    /// Final score, at most 1.0
    pub score: f64,
}

/// Stateless priority scorer
#[derive(Debug, Default, Clone, Copy)]
pub struct PriorityScorer;

impl PriorityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Compute every term of the score. Order matters: the history dampening
    /// applies to the accumulated score, and the cap applies last.
    pub fn breakdown(&self, input: &PriorityInput) -> PriorityBreakdown {
        let base = input
            .severity
            .map_or(UNKNOWN_SEVERITY_BASE, |s| s.base_score());
        let category_multiplier = input
            .category
            .map_or(UNKNOWN_CATEGORY_MULTIPLIER, |c| c.priority_multiplier());

        let mut score = base * category_multiplier;

        let description_lower = input.description.to_lowercase();
        let urgent_keywords: Vec<String> = URGENT_KEYWORDS
            .iter()
            .filter(|k| description_lower.contains(*k))
            .map(|k| k.to_string())
            .collect();
        let urgency_boost = (urgent_keywords.len() as f64 * URGENCY_STEP).min(URGENCY_CAP);
        score += urgency_boost;

        let location_factor = (input.location_frequency as f64 * LOCATION_STEP).min(LOCATION_CAP);
        score += location_factor;

        let history_dampened = input.submitter_history > HISTORY_THRESHOLD;
        if history_dampened {
            score *= HISTORY_DAMPENING;
        }

        PriorityBreakdown {
            base,
            category_multiplier,
            urgency_boost,
            urgent_keywords,
            location_factor,
            history_dampened,
            score: score.min(1.0),
        }
    }

    pub fn score(&self, input: &PriorityInput) -> f64 {
        self.breakdown(input).score
    }
}

/// Compute the priority score of a report.
pub fn compute_priority(
    severity: Option<Severity>,
    category: Option<Category>,
    description: &str,
    submitter_history: u32,
    location_frequency: u32,
) -> f64 {
    PriorityScorer::new().score(&PriorityInput {
        severity,
        category,
        description: description.to_string(),
        submitter_history,
        location_frequency,
    })
}

/// Same as [`compute_priority`] for raw labels; unrecognised labels take the defaults.
pub fn compute_priority_from_labels(
    severity: &str,
    category: &str,
    description: &str,
    submitter_history: u32,
    location_frequency: u32,
) -> f64 {
    compute_priority(
        Severity::parse_label(severity),
        Category::parse_label(category),
        description,
        submitter_history,
        location_frequency,
    )
}
