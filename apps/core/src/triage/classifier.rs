//! Classifier strategies.
//!
//! [`ModelClassifier`] asks the hosted model; [`KeywordClassifier`] applies the
//! deterministic rules. Both implement [`TriageClassifier`], which is the seam the
//! analyzer switches on.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::category::{Category, CategoryClassifier, ClassificationResult};
use super::drafting::{fallback_action_plan, fallback_response};
use super::parse::{malformed, parse_json_reply, CategoryReply, SeverityReply, SpamReply};
use super::severity::{Severity, SeverityClassifier, SeverityResult};
use super::spam::{detect_spam, SpamResult};
use super::summary::{fallback_insights, fallback_weekly_summary, PeriodDigest, Tally};
use super::{feedback_text, ClassifierSource};
use crate::actors::traits::LlmActor;
use crate::error::AppError;
use crate::models::{Feedback, FeedbackStats};

/// Confidence assumed when the model omits one
pub const MODEL_DEFAULT_CONFIDENCE: f32 = 0.8;

/// Every operation the triage pipeline needs from a classifier.
#[async_trait]
pub trait TriageClassifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn categorize(&self, title: &str, description: &str)
        -> Result<ClassificationResult, AppError>;

    async fn detect_severity(&self, title: &str, description: &str)
        -> Result<SeverityResult, AppError>;

    /// `user_history` is the number of reports the submitter filed before.
    async fn detect_spam(
        &self,
        title: &str,
        description: &str,
        user_history: u32,
    ) -> Result<SpamResult, AppError>;

    async fn draft_response(
        &self,
        title: &str,
        description: &str,
        category: Category,
        severity: Severity,
    ) -> Result<String, AppError>;

    async fn draft_action_plan(
        &self,
        title: &str,
        description: &str,
        category: Category,
        severity: Severity,
    ) -> Result<String, AppError>;

    async fn weekly_summary(&self, feedback: &[Feedback]) -> Result<String, AppError>;

    async fn insights(&self, stats: &FeedbackStats) -> Result<String, AppError>;
}

// --- Keyword rules ---

/// Deterministic classifier. Never fails.
#[derive(Debug, Default, Clone)]
pub struct KeywordClassifier {
    category: CategoryClassifier,
    severity: SeverityClassifier,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categorize(&self, title: &str, description: &str) -> ClassificationResult {
        self.category.classify(&feedback_text(title, description))
    }

    pub fn detect_severity(&self, title: &str, description: &str) -> SeverityResult {
        self.severity.classify(&feedback_text(title, description))
    }

    pub fn detect_spam(&self, title: &str, description: &str) -> SpamResult {
        detect_spam(&feedback_text(title, description))
    }

    pub fn draft_response(&self, category: Category, severity: Severity) -> String {
        fallback_response(category, severity)
    }

    pub fn draft_action_plan(&self, category: Category, severity: Severity) -> String {
        fallback_action_plan(category, severity)
    }

    pub fn weekly_summary(&self, feedback: &[Feedback]) -> String {
        fallback_weekly_summary(feedback)
    }

    pub fn insights(&self, stats: &FeedbackStats) -> String {
        fallback_insights(stats)
    }
}

#[async_trait]
impl TriageClassifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn categorize(
        &self,
        title: &str,
        description: &str,
    ) -> Result<ClassificationResult, AppError> {
        Ok(KeywordClassifier::categorize(self, title, description))
    }

    async fn detect_severity(
        &self,
        title: &str,
        description: &str,
    ) -> Result<SeverityResult, AppError> {
        Ok(KeywordClassifier::detect_severity(self, title, description))
    }

    async fn detect_spam(
        &self,
        title: &str,
        description: &str,
        _user_history: u32,
    ) -> Result<SpamResult, AppError> {
        Ok(KeywordClassifier::detect_spam(self, title, description))
    }

    async fn draft_response(
        &self,
        _title: &str,
        _description: &str,
        category: Category,
        severity: Severity,
    ) -> Result<String, AppError> {
        Ok(KeywordClassifier::draft_response(self, category, severity))
    }

    async fn draft_action_plan(
        &self,
        _title: &str,
        _description: &str,
        category: Category,
        severity: Severity,
    ) -> Result<String, AppError> {
        Ok(KeywordClassifier::draft_action_plan(self, category, severity))
    }

    async fn weekly_summary(&self, feedback: &[Feedback]) -> Result<String, AppError> {
        Ok(KeywordClassifier::weekly_summary(self, feedback))
    }

    async fn insights(&self, stats: &FeedbackStats) -> Result<String, AppError> {
        Ok(KeywordClassifier::insights(self, stats))
    }
}

// --- Hosted model ---

/// Classifier backed by an [`LlmActor`].
///
/// Replies must carry a JSON object whose labels come from the closed
/// vocabularies; anything else is reported as a malformed response so the
/// caller can fall back.
pub struct ModelClassifier<L: LlmActor> {
    llm: Arc<L>,
}

impl<L: LlmActor> Clone for ModelClassifier<L> {
    fn clone(&self) -> Self {
        Self {
            llm: Arc::clone(&self.llm),
        }
    }
}

impl<L: LlmActor> ModelClassifier<L> {
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }

    async fn ask(&self, prompt: String) -> Result<String, AppError> {
        let reply = self.llm.generate_with_params(prompt, None, None).await?;
        debug!(reply_chars = reply.len(), "model replied");
        Ok(reply)
    }

    /// Free-text generation; a blank reply counts as malformed.
    async fn ask_text(&self, prompt: String) -> Result<String, AppError> {
        let reply = self.ask(prompt).await?;
        let trimmed = reply.trim();
        if trimmed.is_empty() {
            return Err(malformed("empty text reply".to_string()));
        }
        Ok(trimmed.to_string())
    }
}

fn category_prompt(text: &str) -> String {
    format!(
        "Analyze the following civic feedback and categorize it into ONE of these categories:\n\
         - Traffic (roads, signals, parking, transportation)\n\
         - Sanitation (waste, garbage, cleaning, hygiene)\n\
         - Safety (crime, security, dangerous areas, violence)\n\
         - Water (water supply, leaks, quality, drainage)\n\
         - Electricity (power outages, lines, transformers)\n\
         - Infrastructure (buildings, bridges, streetlights, maintenance)\n\
         - Other (anything that doesn't fit above categories)\n\
         \n\
         Feedback: \"{text}\"\n\
         \n\
         Return ONLY a JSON object with:\n\
         {{\"category\": \"CategoryName\", \"confidence\": 0.95}}\n\
         \n\
         The confidence should be between 0.0 and 1.0.\n"
    )
}

fn severity_prompt(text: &str) -> String {
    format!(
        "Analyze the following civic feedback and determine the severity level:\n\
         \n\
         - High: Immediate danger, health hazard, major infrastructure failure, emergency situations\n\
         - Medium: Significant inconvenience, moderate problems affecting daily life\n\
         - Low: Minor issues, cosmetic problems, routine maintenance needs\n\
         \n\
         Feedback: \"{text}\"\n\
         \n\
         Return ONLY a JSON object with:\n\
         {{\"severity\": \"High/Medium/Low\", \"confidence\": 0.95, \"reasoning\": \"brief explanation\"}}\n"
    )
}

fn spam_prompt(text: &str, user_history: u32) -> String {
    format!(
        "Analyze this civic feedback for spam/fake content. Consider:\n\
         - Relevance to civic issues\n\
         - Coherence and logical content\n\
         - Appropriate language and tone\n\
         - Realistic problem description\n\
         - User has submitted {user_history} feedback items before\n\
         \n\
         Feedback: \"{text}\"\n\
         \n\
         Return ONLY a JSON object with:\n\
         {{\"spam_score\": 0.15, \"reasoning\": \"brief explanation\", \"is_spam\": false}}\n\
         \n\
         spam_score: 0.0 (definitely not spam) to 1.0 (definitely spam)\n\
         is_spam: true if spam_score > 0.7\n"
    )
}

fn response_prompt(title: &str, description: &str, category: Category, severity: Severity) -> String {
    format!(
        "A citizen has submitted this {severity} priority {category} feedback:\n\
         \n\
         Title: {title}\n\
         Description: {description}\n\
         \n\
         Generate a professional, empathetic response that:\n\
         1. Acknowledges the issue\n\
         2. Provides immediate guidance or next steps\n\
         3. Sets appropriate expectations\n\
         4. Maintains a helpful, official tone\n\
         5. Is 2-3 sentences maximum\n\
         \n\
         Do not make specific promises about timeline unless it's emergency.\n",
        severity = severity.label().to_lowercase(),
        category = category.label().to_lowercase(),
    )
}

fn action_plan_prompt(
    title: &str,
    description: &str,
    category: Category,
    severity: Severity,
) -> String {
    format!(
        "Create an action plan for this {severity} priority {category} issue:\n\
         \n\
         Title: {title}\n\
         Description: {description}\n\
         \n\
         Provide a structured action plan with:\n\
         1. Immediate actions (within 24 hours)\n\
         2. Required resources and personnel\n\
         3. Timeline estimate\n\
         4. Responsible department\n\
         5. Follow-up steps\n\
         \n\
         Keep it practical and specific. Max 200 words.\n",
        severity = severity.label().to_lowercase(),
        category = category.label().to_lowercase(),
    )
}

fn distribution(tally: &Tally) -> String {
    let entries: Vec<String> = tally
        .iter()
        .map(|(label, count)| format!("'{label}': {count}"))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn weekly_summary_prompt(digest: &PeriodDigest) -> String {
    format!(
        "Generate an executive summary for this week's civic feedback:\n\
         \n\
         Total Issues: {total}\n\
         Categories: {categories}\n\
         Severity Levels: {severities}\n\
         Status Distribution: {statuses}\n\
         \n\
         Provide insights on:\n\
         1. Main areas of concern\n\
         2. Priority trends\n\
         3. Resolution performance\n\
         4. Recommended actions\n\
         \n\
         Keep it professional and actionable. Max 300 words.\n",
        total = digest.total,
        categories = distribution(&digest.categories),
        severities = distribution(&digest.severities),
        statuses = distribution(&digest.statuses),
    )
}

fn insights_prompt(stats_json: &str) -> String {
    format!(
        "Analyze these civic feedback statistics and provide insights:\n\
         \n\
         {stats_json}\n\
         \n\
         Provide:\n\
         1. Key trends and patterns\n\
         2. Areas needing attention\n\
         3. Performance indicators\n\
         4. Actionable recommendations\n\
         \n\
         Keep it concise and executive-level. Max 250 words.\n"
    )
}

#[async_trait]
impl<L: LlmActor> TriageClassifier for ModelClassifier<L> {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn categorize(
        &self,
        title: &str,
        description: &str,
    ) -> Result<ClassificationResult, AppError> {
        let reply = self
            .ask(category_prompt(&feedback_text(title, description)))
            .await?;
        let parsed: CategoryReply = parse_json_reply(&reply)?;
        let category = Category::parse_label(&parsed.category)
            .ok_or_else(|| malformed(format!("unknown category label: {}", parsed.category)))?;

        Ok(ClassificationResult::new(
            category,
            parsed.confidence.unwrap_or(MODEL_DEFAULT_CONFIDENCE),
            ClassifierSource::Model,
        ))
    }

    async fn detect_severity(
        &self,
        title: &str,
        description: &str,
    ) -> Result<SeverityResult, AppError> {
        let reply = self
            .ask(severity_prompt(&feedback_text(title, description)))
            .await?;
        let parsed: SeverityReply = parse_json_reply(&reply)?;
        let severity = Severity::parse_label(&parsed.severity)
            .ok_or_else(|| malformed(format!("unknown severity label: {}", parsed.severity)))?;

        Ok(SeverityResult::new(
            severity,
            parsed.confidence.unwrap_or(MODEL_DEFAULT_CONFIDENCE),
            ClassifierSource::Model,
        ))
    }

    async fn detect_spam(
        &self,
        title: &str,
        description: &str,
        user_history: u32,
    ) -> Result<SpamResult, AppError> {
        let reply = self
            .ask(spam_prompt(&feedback_text(title, description), user_history))
            .await?;
        let parsed: SpamReply = parse_json_reply(&reply)?;
        if !parsed.spam_score.is_finite() {
            return Err(malformed(format!("non-finite spam score: {}", parsed.spam_score)));
        }

        Ok(SpamResult::new(
            parsed.spam_score,
            parsed
                .reasoning
                .unwrap_or_else(|| "AI analysis completed".to_string()),
            ClassifierSource::Model,
        ))
    }

    async fn draft_response(
        &self,
        title: &str,
        description: &str,
        category: Category,
        severity: Severity,
    ) -> Result<String, AppError> {
        self.ask_text(response_prompt(title, description, category, severity))
            .await
    }

    async fn draft_action_plan(
        &self,
        title: &str,
        description: &str,
        category: Category,
        severity: Severity,
    ) -> Result<String, AppError> {
        self.ask_text(action_plan_prompt(title, description, category, severity))
            .await
    }

    async fn weekly_summary(&self, feedback: &[Feedback]) -> Result<String, AppError> {
        let digest = PeriodDigest::from_feedback(feedback);
        self.ask_text(weekly_summary_prompt(&digest)).await
    }

    async fn insights(&self, stats: &FeedbackStats) -> Result<String, AppError> {
        let stats_json = serde_json::to_string_pretty(stats)?;
        self.ask_text(insights_prompt(&stats_json)).await
    }
}
