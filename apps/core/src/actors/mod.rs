//! Actor wrapping the hosted language model.

pub mod llm;
pub mod messages;
pub mod traits;
