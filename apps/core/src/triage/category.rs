//! Civic issue category classification using keyword tables.
//!
//! Deterministic fallback used whenever the hosted model cannot answer.
//! Matching is plain substring containment on the lower-cased text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ClassifierSource, FALLBACK_CONFIDENCE};

/// Civic issue category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Roads, signals, parking, transportation
    Traffic,
    /// Waste, garbage, cleaning, hygiene
    Sanitation,
    /// Crime, security, dangerous areas
    Safety,
    /// Supply, leaks, quality, drainage
    Water,
    /// Outages, lines, transformers
    Electricity,
    /// Buildings, bridges, streetlights, maintenance
    Infrastructure,
    /// Anything else
    Other,
}

impl Category {
    /// Every category, in the order used for tie-breaking.
    pub const ALL: [Category; 7] = [
        Category::Traffic,
        Category::Sanitation,
        Category::Safety,
        Category::Water,
        Category::Electricity,
        Category::Infrastructure,
        Category::Other,
    ];

    /// Returns the canonical label stored and shown for this category
    pub fn label(&self) -> &'static str {
        match self {
            Category::Traffic => "Traffic",
            Category::Sanitation => "Sanitation",
            Category::Safety => "Safety",
            Category::Water => "Water",
            Category::Electricity => "Electricity",
            Category::Infrastructure => "Infrastructure",
            Category::Other => "Other",
        }
    }

    /// Parses a canonical label, returning `None` for anything outside the taxonomy.
    pub fn parse_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label.trim())
    }

    /// Keywords counted by the fallback classifier. `Other` has none.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Traffic => TRAFFIC_KEYWORDS,
            Category::Sanitation => SANITATION_KEYWORDS,
            Category::Safety => SAFETY_KEYWORDS,
            Category::Water => WATER_KEYWORDS,
            Category::Electricity => ELECTRICITY_KEYWORDS,
            Category::Infrastructure => INFRASTRUCTURE_KEYWORDS,
            Category::Other => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

const TRAFFIC_KEYWORDS: &[&str] = &[
    "traffic",
    "road",
    "car",
    "bus",
    "signal",
    "parking",
    "highway",
    "street",
    "vehicle",
    "transportation",
];

const SANITATION_KEYWORDS: &[&str] = &[
    "garbage",
    "waste",
    "trash",
    "clean",
    "dirty",
    "smell",
    "sanitation",
    "litter",
    "dump",
];

const SAFETY_KEYWORDS: &[&str] = &[
    "crime",
    "police",
    "safety",
    "security",
    "theft",
    "violence",
    "dangerous",
    "unsafe",
    "attack",
];

const WATER_KEYWORDS: &[&str] = &[
    "water", "pipe", "supply", "leak", "flooding", "sewage", "drainage", "tap", "well",
];

const ELECTRICITY_KEYWORDS: &[&str] = &[
    "electricity",
    "power",
    "light",
    "outage",
    "blackout",
    "transformer",
    "electrical",
    "cable",
];

const INFRASTRUCTURE_KEYWORDS: &[&str] = &[
    "building",
    "bridge",
    "road",
    "sidewalk",
    "streetlight",
    "maintenance",
    "repair",
    "construction",
];

/// Result of category classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Detected category
    pub category: Category,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Who produced the answer
    pub source: ClassifierSource,
    /// Keywords that matched for the winning category (empty for model answers)
    pub matched_keywords: Vec<String>,
}

impl ClassificationResult {
    /// Builds a result, clamping confidence into [0, 1].
    pub fn new(category: Category, confidence: f32, source: ClassifierSource) -> Self {
        Self {
            category,
            confidence: super::clamp_confidence(confidence),
            source,
            matched_keywords: Vec::new(),
        }
    }
}

/// Keyword-count category classifier
#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryClassifier;

impl CategoryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify free text into a category.
    ///
    /// The category with the most distinct keyword hits wins; ties go to the
    /// earliest category in [`Category::ALL`]. No hits at all yields `Other`.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let text_lower = text.to_lowercase();

        let mut best = Category::Other;
        let mut best_score = 0usize;
        let mut best_matches = Vec::new();

        for category in Category::ALL {
            let matches: Vec<&str> = category
                .keywords()
                .iter()
                .copied()
                .filter(|keyword| text_lower.contains(keyword))
                .collect();

            if matches.len() > best_score {
                best_score = matches.len();
                best = category;
                best_matches = matches;
            }
        }

        ClassificationResult {
            category: best,
            confidence: FALLBACK_CONFIDENCE,
            source: ClassifierSource::Keyword,
            matched_keywords: best_matches.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Classify text with the keyword fallback.
pub fn classify_category(text: &str) -> ClassificationResult {
    CategoryClassifier::new().classify(text)
}
