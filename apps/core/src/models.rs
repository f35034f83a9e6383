use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::triage::{Category, Severity};

/// Lifecycle state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Rejected,
}

impl FeedbackStatus {
    pub const ALL: [FeedbackStatus; 4] = [
        FeedbackStatus::Pending,
        FeedbackStatus::InProgress,
        FeedbackStatus::Resolved,
        FeedbackStatus::Rejected,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "Pending",
            FeedbackStatus::InProgress => "In Progress",
            FeedbackStatus::Resolved => "Resolved",
            FeedbackStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FeedbackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown status: {s}"))
    }
}

/// A citizen report as submitted.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewFeedback {
    /// Identifier of the submitting citizen (usually an email address).
    #[validate(length(min = 1, max = 254))]
    pub submitter: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    /// Category chosen by the citizen; `None` means auto-detect.
    pub category: Option<Category>,
    /// Severity chosen by the citizen; `None` means auto-detect.
    pub severity: Option<Severity>,
    #[validate(length(max = 500))]
    pub location_detail: Option<String>,
}

/// A stored report.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub id: i64,
    pub submitter: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub severity: Option<String>,
    pub status: String,
    /// Automatic acknowledgement drafted at submission time.
    pub ai_response: Option<String>,
    /// Response written by an administrator.
    pub official_response: Option<String>,
    pub spam_confidence: f64,
    pub priority_score: f64,
    pub location_detail: Option<String>,
    /// Unix timestamps
    pub created_at: i64,
    pub updated_at: i64,
    pub resolved_at: Option<i64>,
    pub is_deleted: bool,
    pub is_public: bool,
}

impl Feedback {
    pub fn category(&self) -> Option<Category> {
        self.category.as_deref().and_then(Category::parse_label)
    }

    pub fn severity(&self) -> Option<Severity> {
        self.severity.as_deref().and_then(Severity::parse_label)
    }

    pub fn status(&self) -> Option<FeedbackStatus> {
        self.status.parse().ok()
    }
}

/// Row written when submitting; everything the triage step decided.
#[derive(Debug, Clone)]
pub struct FeedbackRecord {
    pub submitter: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub severity: Severity,
    pub ai_response: String,
    pub spam_confidence: f64,
    pub priority_score: f64,
    pub location_detail: Option<String>,
}

/// Administrative change to a report. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackUpdate {
    pub status: Option<FeedbackStatus>,
    pub official_response: Option<String>,
    pub ai_response: Option<String>,
    pub category: Option<Category>,
    pub severity: Option<Severity>,
    pub priority_score: Option<f64>,
    pub spam_confidence: Option<f64>,
    /// Whether the report counts towards the public dashboard
    pub is_public: Option<bool>,
    pub change_reason: Option<String>,
}

impl FeedbackUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.official_response.is_none()
            && self.ai_response.is_none()
            && self.category.is_none()
            && self.severity.is_none()
            && self.priority_score.is_none()
            && self.spam_confidence.is_none()
            && self.is_public.is_none()
    }
}

/// Filters for the administrator queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackFilter {
    pub status: Option<FeedbackStatus>,
    pub category: Option<Category>,
    pub severity: Option<Severity>,
    pub include_deleted: bool,
}

/// Audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackHistory {
    pub id: i64,
    pub feedback_id: i64,
    pub changed_by: String,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_reason: Option<String>,
    pub created_at: i64,
}

/// Aggregate statistics over live (not deleted) reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub total_feedback: i64,
    pub recent_feedback: i64,
    pub category_stats: BTreeMap<String, i64>,
    pub severity_stats: BTreeMap<String, i64>,
    pub status_stats: BTreeMap<String, i64>,
    /// Percentage, one decimal place
    pub resolution_rate: f64,
    pub avg_resolution_hours: f64,
    pub potential_spam: i64,
}

/// Submissions per day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrendPoint {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: i64,
    pub resolved: i64,
}

/// Submitted and resolved counts for one `%Y-%W` week.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeeklyTrend {
    pub week: String,
    pub submitted: i64,
    pub resolved: i64,
}

/// Transparency figures over public, live reports. Carries no submitter data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicStats {
    pub total_issues: i64,
    pub resolved_issues: i64,
    pub in_progress_issues: i64,
    pub pending_issues: i64,
    pub resolution_rate: f64,
    pub category_distribution: BTreeMap<String, i64>,
    pub weekly_trends: Vec<WeeklyTrend>,
}

/// Comprehensive analysis over a reporting window.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Unix seconds
    pub generated_at: i64,
    pub days: i64,
    pub summary_stats: FeedbackStats,
    pub trend_data: Vec<TrendPoint>,
    /// Live reports created inside the window
    pub feedback_count: usize,
    pub analysis: String,
}
