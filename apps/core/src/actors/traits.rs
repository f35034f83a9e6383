use crate::actors::messages::AppError;
use async_trait::async_trait;

/// Defines the public interface for an LLM (Large Language Model) actor.
///
/// This trait abstracts the specific implementation of the LLM, allowing for different
/// backends (e.g., the hosted Gemini API, a scripted test double) to be used interchangeably.
#[async_trait]
pub trait LlmActor: Send + Sync + 'static {
    /// Generates a complete text response based on a prompt and optional parameters.
    async fn generate_with_params(
        &self,
        prompt: String,
        system_prompt: Option<String>,
        temperature: Option<f32>,
    ) -> Result<String, AppError>;
}
