//! Triage Engine Tests
//!
//! Properties of the deterministic classifiers and the priority formula.

use crate::triage::{
    classify_category, classify_severity, compute_priority, compute_priority_from_labels,
    detect_spam, spam_score, Category, ClassifierSource, PriorityInput, PriorityScorer, Severity,
    FALLBACK_CONFIDENCE, SPAM_THRESHOLD,
};

const EPS: f64 = 1e-9;

// ============================================================================
// Category
// ============================================================================

#[cfg(test)]
mod category_tests {
    use super::*;

    #[test]
    fn test_output_is_always_in_taxonomy() {
        let inputs = [
            "",
            "   ",
            "Bus stop sign fell over",
            "Sewage overflowing into the park",
            "¿Dónde está la basura?",
            "12345 !!!",
        ];
        for text in inputs {
            let result = classify_category(text);
            assert!(Category::ALL.contains(&result.category), "{text:?}");
            assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
        }
    }

    #[test]
    fn test_no_keywords_is_other() {
        assert_eq!(classify_category("").category, Category::Other);
        assert_eq!(
            classify_category("The mayor gave a nice speech").category,
            Category::Other
        );
    }

    #[test]
    fn test_most_hits_wins() {
        // Water: water, pipe, leak; Traffic: street
        let result = classify_category("Water pipe leak on the street");
        assert_eq!(result.category, Category::Water);
        assert_eq!(result.matched_keywords.len(), 3);
    }

    #[test]
    fn test_tie_goes_to_earlier_category() {
        // One hit each for Sanitation ("garbage") and Safety ("police").
        assert_eq!(
            classify_category("garbage police").category,
            Category::Sanitation
        );
        // "road" counts for Traffic and Infrastructure alike.
        assert_eq!(classify_category("road").category, Category::Traffic);
    }

    #[test]
    fn test_substring_matching() {
        // "streetlight" contains "street" and "light": Traffic, Electricity and
        // Infrastructure score one each, Traffic comes first.
        assert_eq!(classify_category("streetlight").category, Category::Traffic);
    }

    #[test]
    fn test_idempotent() {
        let text = "Transformer blew and there is a power outage";
        assert_eq!(classify_category(text), classify_category(text));
    }
}

// ============================================================================
// Severity
// ============================================================================

#[cfg(test)]
mod severity_tests {
    use super::*;

    #[test]
    fn test_fire_is_high() {
        let result = classify_severity("There is a fire in the dumpster");
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.source, ClassifierSource::Keyword);
    }

    #[test]
    fn test_high_beats_medium() {
        let result = classify_severity("Minor issue but the light is broken");
        assert_eq!(result.severity, Severity::High);
    }

    #[test]
    fn test_medium_and_low() {
        assert_eq!(
            classify_severity("Small problem with the bench").severity,
            Severity::Medium
        );
        assert_eq!(
            classify_severity("Please repaint the bench").severity,
            Severity::Low
        );
        assert_eq!(classify_severity("").severity, Severity::Low);
    }

    #[test]
    fn test_idempotent() {
        let text = "Minor flooding near the school, water is not working";
        assert_eq!(classify_severity(text), classify_severity(text));
    }

    #[test]
    fn test_multiword_phrase() {
        assert_eq!(
            classify_severity("The pump is NOT WORKING").severity,
            Severity::High
        );
    }
}

// ============================================================================
// Spam
// ============================================================================

#[cfg(test)]
mod spam_tests {
    use super::*;

    #[test]
    fn test_promotional_short_text() {
        // short (0.3) + promotional (0.4); lower case so no shouting signal
        let result = detect_spam("buy now");
        assert!((result.spam_score - 0.7).abs() < EPS);
        assert!(!result.is_spam);
    }

    #[test]
    fn test_everything_fires() {
        // short + exclamations + promotional + capitals = 1.1, capped
        let result = detect_spam("WIN!!!!");
        assert_eq!(result.spam_score, 1.0);
        assert!(result.is_spam);
    }

    #[test]
    fn test_help_shouting() {
        // short + exclamations + capitals = 0.7, not above the threshold
        let result = detect_spam("HELP!!!!");
        assert!((result.spam_score - 0.7).abs() < EPS);
        assert!(!result.is_spam);
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!((SPAM_THRESHOLD - 0.7).abs() < EPS);
        let result = detect_spam("Click here for free money, win big prizes today!!!!");
        // exclamations + promotional
        assert!((result.spam_score - 0.6).abs() < EPS);
        assert!(!result.is_spam);
    }

    #[test]
    fn test_no_cased_characters_is_not_shouting() {
        // digits only: short, but not "all caps"
        assert!((spam_score("12345") - 0.3).abs() < EPS);
    }

    #[test]
    fn test_promotional_words_alone() {
        // Long enough, no exclamations, lower case: only the promotional signal fires
        let result = detect_spam("free money click buy win");
        assert!((result.spam_score - 0.4).abs() < EPS);
        assert!(!result.is_spam);
    }

    #[test]
    fn test_idempotent() {
        for text in ["free money click buy win", "HELP!!!!", "Broken bench in the park"] {
            assert_eq!(detect_spam(text), detect_spam(text));
        }
    }

    #[test]
    fn test_score_is_bounded() {
        for text in ["", "a", "FREE MONEY!!!!!!!!", "A perfectly normal report about a bench"] {
            let score = spam_score(text);
            assert!((0.0..=1.0).contains(&score), "{text:?} -> {score}");
        }
    }
}

// ============================================================================
// Priority
// ============================================================================

#[cfg(test)]
mod priority_tests {
    use super::*;

    #[test]
    fn test_worked_example_capped() {
        // 0.8 * 1.2 = 0.96, + 0.1 urgency = 1.06, capped
        let score = compute_priority(
            Some(Severity::High),
            Some(Category::Safety),
            "This is an emergency",
            0,
            0,
        );
        assert!((score - 1.0).abs() < EPS);
    }

    #[test]
    fn test_worked_example_dampened() {
        // 0.2 * 0.7 = 0.14, * 0.95 = 0.133
        let score = compute_priority(
            Some(Severity::Low),
            Some(Category::Other),
            "Bench paint peeling",
            11,
            0,
        );
        assert!((score - 0.133).abs() < EPS, "got {score}");
    }

    #[test]
    fn test_urgency_capped_at_three_keywords() {
        let breakdown = PriorityScorer::new().breakdown(&PriorityInput {
            severity: Some(Severity::Low),
            category: Some(Category::Traffic),
            description: "emergency urgent immediate dangerous broken".into(),
            ..Default::default()
        });
        assert_eq!(breakdown.urgent_keywords.len(), 5);
        assert!((breakdown.urgency_boost - 0.3).abs() < EPS);
        assert!((breakdown.score - 0.5).abs() < EPS);
    }

    #[test]
    fn test_location_factor_capped() {
        let low = compute_priority(Some(Severity::Low), Some(Category::Traffic), "", 0, 2);
        let high = compute_priority(Some(Severity::Low), Some(Category::Traffic), "", 0, 100);
        assert!((low - 0.3).abs() < EPS);
        assert!((high - 0.4).abs() < EPS);
    }

    #[test]
    fn test_history_threshold_is_strict() {
        let at_ten = compute_priority(Some(Severity::Medium), Some(Category::Traffic), "", 10, 0);
        let at_eleven =
            compute_priority(Some(Severity::Medium), Some(Category::Traffic), "", 11, 0);
        assert!((at_ten - 0.5).abs() < EPS);
        assert!((at_eleven - 0.475).abs() < EPS);
    }

    #[test]
    fn test_dampening_applies_before_cap() {
        // 0.8 * 1.2 + 0.3 + 0.2 = 1.46, * 0.95 = 1.387, capped at 1.0
        let score = compute_priority(
            Some(Severity::High),
            Some(Category::Safety),
            "emergency, urgent and dangerous",
            20,
            10,
        );
        assert!((score - 1.0).abs() < EPS);
    }

    #[test]
    fn test_unknown_labels() {
        let score = compute_priority_from_labels("Critical", "Parks", "", 0, 0);
        assert!((score - 0.3).abs() < EPS);
        let score = compute_priority_from_labels("High", "Parks", "", 0, 0);
        assert!((score - 0.8).abs() < EPS);
    }

    #[test]
    fn test_idempotent() {
        let first = compute_priority(
            Some(Severity::Medium),
            Some(Category::Water),
            "Urgent: pipe burst, flooding the basement",
            4,
            2,
        );
        let second = compute_priority(
            Some(Severity::Medium),
            Some(Category::Water),
            "Urgent: pipe burst, flooding the basement",
            4,
            2,
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_bounded_for_all_labels() {
        for severity in Severity::ALL {
            for category in Category::ALL {
                let score = compute_priority(
                    Some(severity),
                    Some(category),
                    "emergency urgent immediate flooding",
                    50,
                    50,
                );
                assert!((0.0..=1.0).contains(&score));
            }
        }
    }
}
