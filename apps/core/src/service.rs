//! Feedback workflow: submission, administration, moderation and reporting.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::database;
use crate::error::AppError;
use crate::models::{
    AnalysisReport, Feedback, FeedbackFilter, FeedbackHistory, FeedbackRecord, FeedbackStats,
    FeedbackStatus, FeedbackUpdate, NewFeedback, PublicStats, TrendPoint,
};
use crate::triage::summary::analysis_text;
use crate::triage::{Category, FeedbackItem, PriorityInput, Severity, TriageAnalyzer, TriageReport};

/// Reports scoring above this appear in the moderation queue.
pub const MODERATION_MIN_SPAM: f64 = 0.3;
/// Official response written when a moderator rejects a report.
pub const REJECTION_RESPONSE: &str = "Content flagged as inappropriate or spam.";
/// Window covered by the weekly summary.
pub const SUMMARY_WINDOW_DAYS: i64 = 7;

/// A stored report together with the triage that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub feedback: Feedback,
    pub triage: TriageReport,
}

#[derive(Clone)]
pub struct FeedbackService {
    pool: SqlitePool,
    analyzer: Arc<TriageAnalyzer>,
}

fn to_count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn non_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}

impl FeedbackService {
    pub fn new(pool: SqlitePool, analyzer: Arc<TriageAnalyzer>) -> Self {
        Self { pool, analyzer }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn analyzer(&self) -> &TriageAnalyzer {
        &self.analyzer
    }

    /// Triage and store a new report.
    #[instrument(skip(self, new), fields(submitter = %new.submitter))]
    pub async fn submit(&self, new: NewFeedback) -> Result<Submission, AppError> {
        new.validate()?;
        non_blank("submitter", &new.submitter)?;
        non_blank("title", &new.title)?;
        non_blank("description", &new.description)?;

        let location_detail = new
            .location_detail
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);

        let submitter_history =
            to_count(database::count_submitter_feedback(&self.pool, &new.submitter).await?);
        let location_frequency = match &location_detail {
            Some(location) => to_count(database::count_location_reports(&self.pool, location).await?),
            None => 0,
        };

        let item = FeedbackItem {
            title: new.title.clone(),
            description: new.description.clone(),
            category: new.category,
            severity: new.severity,
            submitter_history,
            location_frequency,
        };
        let triage = self.analyzer.analyze(&item).await;

        let record = FeedbackRecord {
            submitter: new.submitter,
            title: new.title,
            description: new.description,
            category: triage.category.category,
            severity: triage.severity.severity,
            ai_response: triage.ai_response.clone(),
            spam_confidence: triage.spam.spam_score,
            priority_score: triage.priority,
            location_detail,
        };
        let feedback = database::insert_feedback(&self.pool, &record).await?;

        if triage.spam.is_spam {
            warn!(id = feedback.id, spam_score = triage.spam.spam_score, "Submission looks like spam");
        }
        info!(id = feedback.id, priority = feedback.priority_score, "Feedback submitted");

        Ok(Submission { feedback, triage })
    }

    pub async fn get(&self, id: i64) -> Result<Feedback, AppError> {
        database::get_feedback(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("feedback {id}")))
    }

    pub async fn list(&self, filter: &FeedbackFilter) -> Result<Vec<Feedback>, AppError> {
        Ok(database::list_feedback(&self.pool, filter).await?)
    }

    pub async fn list_for_submitter(&self, submitter: &str) -> Result<Vec<Feedback>, AppError> {
        Ok(database::list_submitter_feedback(&self.pool, submitter).await?)
    }

    pub async fn history(&self, id: i64) -> Result<Vec<FeedbackHistory>, AppError> {
        Ok(database::get_feedback_history(&self.pool, id).await?)
    }

    /// Administrative status and response changes.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: i64,
        update: FeedbackUpdate,
        changed_by: &str,
    ) -> Result<Feedback, AppError> {
        database::apply_update(&self.pool, id, &update, changed_by).await
    }

    /// Override category and/or severity; the priority score follows.
    #[instrument(skip(self, reason))]
    pub async fn reclassify(
        &self,
        id: i64,
        category: Option<Category>,
        severity: Option<Severity>,
        changed_by: &str,
        reason: Option<String>,
    ) -> Result<Feedback, AppError> {
        if category.is_none() && severity.is_none() {
            return Err(AppError::Validation(
                "reclassification needs a category or a severity".to_string(),
            ));
        }

        let current = self.get(id).await?;
        let new_category = category.or_else(|| current.category());
        let new_severity = severity.or_else(|| current.severity());

        // Counters exclude the report itself, as they did at submission time.
        let submitter_history = to_count(
            database::count_submitter_feedback(&self.pool, &current.submitter).await? - 1,
        );
        let location_frequency = match &current.location_detail {
            Some(location) => {
                to_count(database::count_location_reports(&self.pool, location).await? - 1)
            }
            None => 0,
        };

        let breakdown = self.analyzer.prioritize(&PriorityInput {
            severity: new_severity,
            category: new_category,
            description: current.description.clone(),
            submitter_history,
            location_frequency,
        });

        let update = FeedbackUpdate {
            category,
            severity,
            priority_score: Some(breakdown.score),
            change_reason: reason,
            ..Default::default()
        };
        database::apply_update(&self.pool, id, &update, changed_by).await
    }

    /// Soft delete by the submitter who filed the report.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64, submitter: &str) -> Result<(), AppError> {
        if database::soft_delete_feedback(&self.pool, id, submitter).await? {
            info!(id, "Feedback deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "feedback {id} filed by {submitter}"
            )))
        }
    }

    // --- Moderation ---

    pub async fn spam_candidates(&self) -> Result<Vec<Feedback>, AppError> {
        Ok(database::spam_candidates(&self.pool, MODERATION_MIN_SPAM).await?)
    }

    /// Clear the spam score of a legitimate report.
    #[instrument(skip(self))]
    pub async fn approve(&self, id: i64, moderator: &str) -> Result<Feedback, AppError> {
        let update = FeedbackUpdate {
            spam_confidence: Some(0.0),
            change_reason: Some("Approved by moderator".to_string()),
            ..Default::default()
        };
        database::apply_update(&self.pool, id, &update, moderator).await
    }

    /// Reject a report as spam.
    #[instrument(skip(self))]
    pub async fn reject(&self, id: i64, moderator: &str) -> Result<Feedback, AppError> {
        let update = FeedbackUpdate {
            status: Some(FeedbackStatus::Rejected),
            official_response: Some(REJECTION_RESPONSE.to_string()),
            change_reason: Some("Rejected by moderator".to_string()),
            ..Default::default()
        };
        database::apply_update(&self.pool, id, &update, moderator).await
    }

    // --- Reporting ---

    pub async fn stats(&self, days: i64) -> Result<FeedbackStats, AppError> {
        Ok(database::feedback_stats(&self.pool, days).await?)
    }

    pub async fn trends(&self, days: i64) -> Result<Vec<TrendPoint>, AppError> {
        Ok(database::trend_data(&self.pool, days).await?)
    }

    /// Figures for the public transparency dashboard.
    pub async fn public_stats(&self) -> Result<PublicStats, AppError> {
        Ok(database::public_stats(&self.pool).await?)
    }

    /// Statistics, trends and an executive summary over the last `days` days.
    #[instrument(skip(self))]
    pub async fn analysis_report(&self, days: i64) -> Result<AnalysisReport, AppError> {
        let summary_stats = self.stats(days).await?;
        let trend_data = self.trends(days).await?;
        let feedback_count = database::feedback_since(&self.pool, days).await?.len();
        let analysis = analysis_text(&summary_stats);

        info!(days, feedback_count, "analysis report generated");
        Ok(AnalysisReport {
            generated_at: chrono::Utc::now().timestamp(),
            days,
            summary_stats,
            trend_data,
            feedback_count,
            analysis,
        })
    }

    #[instrument(skip(self))]
    pub async fn weekly_summary(&self) -> Result<String, AppError> {
        let feedback = database::feedback_since(&self.pool, SUMMARY_WINDOW_DAYS).await?;
        Ok(self.analyzer.weekly_summary(&feedback).await)
    }

    #[instrument(skip(self))]
    pub async fn insights(&self, days: i64) -> Result<String, AppError> {
        let stats = self.stats(days).await?;
        Ok(self.analyzer.insights(&stats).await)
    }

    #[instrument(skip(self))]
    pub async fn action_plan(&self, id: i64) -> Result<String, AppError> {
        let feedback = self.get(id).await?;
        let category = feedback.category().unwrap_or(Category::Other);
        let severity = feedback.severity().unwrap_or(Severity::Low);
        Ok(self
            .analyzer
            .action_plan(&feedback.title, &feedback.description, category, severity)
            .await)
    }
}
