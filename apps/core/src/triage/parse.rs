//! Extraction of JSON objects from free-form model replies.
//!
//! Models tend to wrap the requested object in prose or code fences, so the
//! widest `{ ... }` span is taken and decoded.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::actors::messages::ActorError;
use crate::error::AppError;

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("Invalid regex: JSON object span"));

/// Decode the first-to-last brace span of `text` into `T`.
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, AppError> {
    let span = JSON_OBJECT
        .find(text)
        .ok_or_else(|| malformed(format!("no JSON object in reply: {}", preview(text))))?;

    serde_json::from_str(span.as_str())
        .map_err(|e| malformed(format!("undecodable JSON in reply ({e}): {}", preview(text))))
}

pub(crate) fn malformed(message: String) -> AppError {
    AppError::Actor(ActorError::MalformedResponse(message))
}

fn preview(text: &str) -> String {
    text.chars().take(120).collect()
}

#[derive(Debug, Deserialize)]
pub struct CategoryReply {
    pub category: String,
    pub confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct SeverityReply {
    pub severity: String,
    pub confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct SpamReply {
    pub spam_score: f64,
    pub reasoning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_fenced_reply() {
        let reply = "```json\n{\"category\": \"Water\", \"confidence\": 0.91}\n```";
        let parsed: CategoryReply = parse_json_reply(reply).unwrap();
        assert_eq!(parsed.category, "Water");
        assert_eq!(parsed.confidence, Some(0.91));
    }

    #[test]
    fn test_multiline_object() {
        let reply = "Sure!\n{\n  \"spam_score\": 0.15,\n  \"reasoning\": \"looks real\"\n}\nThanks";
        let parsed: SpamReply = parse_json_reply(reply).unwrap();
        assert!((parsed.spam_score - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_missing_object_is_malformed() {
        let err = parse_json_reply::<CategoryReply>("I think it is Traffic").unwrap_err();
        assert!(matches!(err, AppError::Actor(ActorError::MalformedResponse(_))));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = parse_json_reply::<CategoryReply>("{\"confidence\": 0.5}").unwrap_err();
        assert!(matches!(err, AppError::Actor(ActorError::MalformedResponse(_))));
    }
}
