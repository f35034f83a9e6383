//! Triage Analyzer - Main orchestrator for the Triage module.
//!
//! Runs category, severity and spam classification for a report concurrently,
//! then scores its priority and drafts the acknowledgement.
//!
//! Uses a two-tier strategy for every operation:
//! 1. The remote classifier, bounded by a timeout, when one is configured
//! 2. The keyword rules whenever the remote one errors, times out or answers
//!    with something unusable

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::category::{Category, ClassificationResult};
use super::classifier::{KeywordClassifier, ModelClassifier, TriageClassifier};
use super::priority::{PriorityBreakdown, PriorityInput, PriorityScorer};
use super::severity::{Severity, SeverityResult};
use super::spam::SpamResult;
use super::ClassifierSource;
use crate::actors::traits::LlmActor;
use crate::error::AppError;
use crate::models::{Feedback, FeedbackStats};

pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(20);

/// A report ready for triage, with the counters the priority formula needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub title: String,
    pub description: String,
    /// Chosen by the submitter; skips classification when set
    pub category: Option<Category>,
    /// Chosen by the submitter; skips classification when set
    pub severity: Option<Severity>,
    /// Earlier reports by the same submitter
    pub submitter_history: u32,
    /// Earlier reports at the same location
    pub location_frequency: u32,
}

/// Everything triage decided about one report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageReport {
    pub category: ClassificationResult,
    pub severity: SeverityResult,
    pub spam: SpamResult,
    pub priority: f64,
    pub priority_breakdown: PriorityBreakdown,
    /// Acknowledgement for the citizen
    pub ai_response: String,
}

/// Orchestrates classification with automatic fallback
#[derive(Clone)]
pub struct TriageAnalyzer {
    remote: Option<Arc<dyn TriageClassifier>>,
    fallback: KeywordClassifier,
    scorer: PriorityScorer,
    remote_timeout: Duration,
}

impl Default for TriageAnalyzer {
    fn default() -> Self {
        Self::keyword_only()
    }
}

impl TriageAnalyzer {
    pub fn new(remote: Option<Arc<dyn TriageClassifier>>, remote_timeout: Duration) -> Self {
        Self {
            remote,
            fallback: KeywordClassifier::new(),
            scorer: PriorityScorer::new(),
            remote_timeout,
        }
    }

    /// Analyzer that only ever uses the keyword rules
    pub fn keyword_only() -> Self {
        Self::new(None, DEFAULT_REMOTE_TIMEOUT)
    }

    /// Analyzer backed by a hosted model
    pub fn with_model<L: LlmActor>(llm: Arc<L>, remote_timeout: Duration) -> Self {
        let remote: Arc<dyn TriageClassifier> = Arc::new(ModelClassifier::new(llm));
        Self::new(Some(remote), remote_timeout)
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Run one remote call; `None` means "use the fallback".
    async fn attempt<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, AppError>>,
    ) -> Option<T> {
        match timeout(self.remote_timeout, call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(operation, error = %e, "Remote classifier failed, using keyword fallback");
                None
            }
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.remote_timeout.as_millis() as u64,
                    "Remote classifier timed out, using keyword fallback"
                );
                None
            }
        }
    }

    pub async fn categorize(&self, title: &str, description: &str) -> ClassificationResult {
        if let Some(remote) = &self.remote {
            if let Some(result) = self
                .attempt("categorize", remote.categorize(title, description))
                .await
            {
                return result;
            }
        }
        self.fallback.categorize(title, description)
    }

    pub async fn detect_severity(&self, title: &str, description: &str) -> SeverityResult {
        if let Some(remote) = &self.remote {
            if let Some(result) = self
                .attempt("detect_severity", remote.detect_severity(title, description))
                .await
            {
                return result;
            }
        }
        self.fallback.detect_severity(title, description)
    }

    pub async fn detect_spam(&self, title: &str, description: &str, user_history: u32) -> SpamResult {
        if let Some(remote) = &self.remote {
            if let Some(result) = self
                .attempt(
                    "detect_spam",
                    remote.detect_spam(title, description, user_history),
                )
                .await
            {
                return result;
            }
        }
        self.fallback.detect_spam(title, description)
    }

    pub async fn draft_response(
        &self,
        title: &str,
        description: &str,
        category: Category,
        severity: Severity,
    ) -> String {
        if let Some(remote) = &self.remote {
            if let Some(text) = self
                .attempt(
                    "draft_response",
                    remote.draft_response(title, description, category, severity),
                )
                .await
            {
                return text;
            }
        }
        self.fallback.draft_response(category, severity)
    }

    pub async fn action_plan(
        &self,
        title: &str,
        description: &str,
        category: Category,
        severity: Severity,
    ) -> String {
        if let Some(remote) = &self.remote {
            if let Some(text) = self
                .attempt(
                    "action_plan",
                    remote.draft_action_plan(title, description, category, severity),
                )
                .await
            {
                return text;
            }
        }
        self.fallback.draft_action_plan(category, severity)
    }

    /// Executive summary of a period. An empty period never reaches the model.
    pub async fn weekly_summary(&self, feedback: &[Feedback]) -> String {
        if feedback.is_empty() {
            return self.fallback.weekly_summary(feedback);
        }
        if let Some(remote) = &self.remote {
            if let Some(text) = self
                .attempt("weekly_summary", remote.weekly_summary(feedback))
                .await
            {
                return text;
            }
        }
        self.fallback.weekly_summary(feedback)
    }

    pub async fn insights(&self, stats: &FeedbackStats) -> String {
        if let Some(remote) = &self.remote {
            if let Some(text) = self.attempt("insights", remote.insights(stats)).await {
                return text;
            }
        }
        self.fallback.insights(stats)
    }

    pub fn prioritize(&self, input: &PriorityInput) -> PriorityBreakdown {
        self.scorer.breakdown(input)
    }

    /// Full triage of one report.
    ///
    /// The three classifications run concurrently; priority and the drafted
    /// response are computed once all of them have resolved.
    pub async fn analyze(&self, item: &FeedbackItem) -> TriageReport {
        let start = Instant::now();
        let title = item.title.as_str();
        let description = item.description.as_str();

        let category_task = async {
            match item.category {
                Some(category) => {
                    ClassificationResult::new(category, 1.0, ClassifierSource::Submitter)
                }
                None => self.categorize(title, description).await,
            }
        };
        let severity_task = async {
            match item.severity {
                Some(severity) => SeverityResult::new(severity, 1.0, ClassifierSource::Submitter),
                None => self.detect_severity(title, description).await,
            }
        };
        let spam_task = self.detect_spam(title, description, item.submitter_history);

        let (category, severity, spam) = tokio::join!(category_task, severity_task, spam_task);
        debug!(
            category = %category.category,
            severity = %severity.severity,
            spam_score = spam.spam_score,
            "Classification complete"
        );

        let priority_breakdown = self.prioritize(&PriorityInput {
            severity: Some(severity.severity),
            category: Some(category.category),
            description: item.description.clone(),
            submitter_history: item.submitter_history,
            location_frequency: item.location_frequency,
        });

        let ai_response = self
            .draft_response(title, description, category.category, severity.severity)
            .await;

        info!(
            category = %category.category,
            severity = %severity.severity,
            priority = priority_breakdown.score,
            is_spam = spam.is_spam,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Triage complete"
        );

        TriageReport {
            category,
            severity,
            spam,
            priority: priority_breakdown.score,
            priority_breakdown,
            ai_response,
        }
    }
}
