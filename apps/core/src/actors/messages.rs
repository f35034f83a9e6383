use serde::Serialize;
use tokio::sync::oneshot;

/// Defines errors that can occur while talking to the hosted model.
#[derive(Debug, thiserror::Error, Serialize, Clone)]
pub enum ActorError {
    /// The model API refused or failed the request.
    #[error("LLM request failed: {0}")]
    LlmError(String),
    /// The model answered, but not with something usable.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
    /// A generic internal error within an actor (e.g. a closed channel).
    #[error("Internal system error: {0}")]
    Internal(String),
    /// An error indicating that an actor operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl From<tokio::time::error::Elapsed> for ActorError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ActorError::Timeout(format!("Actor operation timed out: {}", err))
    }
}

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Messages that can be sent to the `LlmActor`.
#[derive(Debug)]
pub enum LlmMessage {
    /// A request to generate a complete text response with specific parameters.
    GenerateWithParams {
        prompt: String,
        system_prompt: Option<String>,
        temperature: Option<f32>,
        /// A channel to send the final `String` result back.
        responder: oneshot::Sender<Result<String, AppError>>,
    },
}
