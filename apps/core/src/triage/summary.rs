//! Weekly summaries and dashboard insights built from stored reports.

use crate::models::{Feedback, FeedbackStats};

pub const EMPTY_PERIOD_MESSAGE: &str = "No feedback data available for this period.";
pub const INSUFFICIENT_DATA_MESSAGE: &str = "Insufficient data for meaningful insights.";

/// Counts per label, keeping first-seen order so ties resolve to the earliest label.
#[derive(Debug, Default, Clone)]
pub struct Tally {
    entries: Vec<(String, usize)>,
}

impl Tally {
    pub fn add(&mut self, label: &str) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((label.to_string(), 1)),
        }
    }

    /// Most frequent label; the earliest one wins a tie.
    pub fn top(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for (label, count) in &self.entries {
            if best.map_or(true, |(_, c)| *count > c) {
                best = Some((label.as_str(), *count));
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }
}

/// Distribution figures for a batch of reports.
#[derive(Debug, Default, Clone)]
pub struct PeriodDigest {
    pub total: usize,
    pub resolved: usize,
    pub categories: Tally,
    pub severities: Tally,
    pub statuses: Tally,
}

impl PeriodDigest {
    pub fn from_feedback(feedback: &[Feedback]) -> Self {
        let mut digest = PeriodDigest {
            total: feedback.len(),
            ..Default::default()
        };

        for item in feedback {
            digest
                .categories
                .add(item.category.as_deref().unwrap_or("Unknown"));
            digest
                .severities
                .add(item.severity.as_deref().unwrap_or("Unknown"));
            digest.statuses.add(&item.status);
            if item.status == "Resolved" {
                digest.resolved += 1;
            }
        }

        digest
    }

    /// Percentage of resolved reports, rounded to one decimal.
    pub fn resolution_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        round1(self.resolved as f64 / self.total as f64 * 100.0)
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn bullet_list(tally: &Tally) -> String {
    tally
        .iter()
        .map(|(label, count)| format!("• {label}: {count}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Template summary of a week of reports.
pub fn fallback_weekly_summary(feedback: &[Feedback]) -> String {
    if feedback.is_empty() {
        return EMPTY_PERIOD_MESSAGE.to_string();
    }

    let digest = PeriodDigest::from_feedback(feedback);
    let (top_category, top_count) = digest.categories.top().unwrap_or(("None", 0));
    let top_severity = digest
        .severities
        .top()
        .map_or("all".to_string(), |(s, _)| s.to_lowercase());
    let resolution_rate = digest.resolution_rate();
    let performance = if resolution_rate > 70.0 {
        "exceeds"
    } else {
        "needs improvement from"
    };
    let top_lower = top_category.to_lowercase();

    format!(
        "**WEEKLY CIVIC FEEDBACK SUMMARY**\n\n\
         **Overview:**\n\
         • Total issues reported: {total}\n\
         • Issues resolved: {resolved} ({resolution_rate:.1}% resolution rate)\n\
         • Top concern category: {top_category} ({top_count} reports)\n\n\
         **Category Distribution:**\n{categories}\n\n\
         **Severity Breakdown:**\n{severities}\n\n\
         **Key Insights:**\n\
         • {top_category} represents the primary citizen concern this week\n\
         • Resolution rate of {resolution_rate:.1}% {performance} target performance\n\
         • Continued monitoring recommended for {top_lower} issues\n\n\
         **Recommendations:**\n\
         • Focus additional resources on {top_lower} department\n\
         • Review response protocols for {top_severity} priority issues\n\
         • Enhance citizen communication for transparency\n",
        total = digest.total,
        resolved = digest.resolved,
        categories = bullet_list(&digest.categories),
        severities = bullet_list(&digest.severities),
    )
}

/// Template insights over dashboard statistics.
pub fn fallback_insights(stats: &FeedbackStats) -> String {
    if stats.total_feedback == 0 {
        return INSUFFICIENT_DATA_MESSAGE.to_string();
    }

    let mut top_category = "Unknown";
    let mut top_count = 0;
    for (category, count) in &stats.category_stats {
        if *count > top_count {
            top_category = category.as_str();
            top_count = *count;
        }
    }
    let top_lower = top_category.to_lowercase();
    let performance = if stats.resolution_rate > 75.0 {
        "exceeds standards"
    } else {
        "requires attention"
    };

    format!(
        "**CIVIC FEEDBACK INSIGHTS**\n\n\
         **Performance Overview:**\n\
         • Total feedback processed: {total}\n\
         • Current resolution rate: {rate:.1}%\n\
         • Primary concern area: {top_category}\n\n\
         **Key Trends:**\n\
         • {top_category} issues represent the highest volume of citizen concerns\n\
         • Resolution performance {performance}\n\
         • Citizen engagement remains active with consistent feedback submission\n\n\
         **Strategic Recommendations:**\n\
         • Prioritize resource allocation to {top_lower} department\n\
         • Implement proactive measures to prevent recurring {top_lower} issues\n\
         • Enhance response time protocols for high-priority items\n\
         • Strengthen citizen communication and transparency initiatives\n\n\
         **Action Items:**\n\
         • Review {top_lower} operational procedures\n\
         • Establish performance metrics for response time improvement\n\
         • Consider preventive maintenance programs\n\
         • Develop citizen satisfaction measurement system\n",
        total = stats.total_feedback,
        rate = stats.resolution_rate,
    )
}

/// Rating of a resolution rate in the comprehensive analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionVerdict {
    Excellent,
    Good,
    NeedsImprovement,
}

impl ResolutionVerdict {
    /// Strictly above 80 is excellent, strictly above 60 is good.
    pub fn from_rate(resolution_rate: f64) -> Self {
        if resolution_rate > 80.0 {
            ResolutionVerdict::Excellent
        } else if resolution_rate > 60.0 {
            ResolutionVerdict::Good
        } else {
            ResolutionVerdict::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResolutionVerdict::Excellent => "Excellent",
            ResolutionVerdict::Good => "Good",
            ResolutionVerdict::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Executive summary text of the comprehensive analysis report.
pub fn analysis_text(stats: &FeedbackStats) -> String {
    let mut text = format!(
        "**EXECUTIVE SUMMARY**\n\n\
         Total Issues Processed: {}\n\
         Resolution Rate: {:.1}%\n\n\
         **KEY INSIGHTS:**",
        stats.total_feedback, stats.resolution_rate
    );

    let mut top: Option<(&str, i64)> = None;
    for (category, count) in &stats.category_stats {
        if top.map_or(true, |(_, c)| *count > c) {
            top = Some((category.as_str(), *count));
        }
    }
    if let Some((category, count)) = top {
        text.push_str(&format!("\n• Primary concern area: {category} ({count} reports)"));
    }

    text.push_str(&format!(
        "\n• Resolution performance: {}",
        ResolutionVerdict::from_rate(stats.resolution_rate).label()
    ));
    text
}
