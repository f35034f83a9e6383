use crate::actors::messages::{ActorError, AppError, LlmMessage};
use crate::actors::traits::LlmActor;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

// --- Constants ---
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Extra time the handle waits beyond the HTTP timeout before giving up on the runner.
const RESPONDER_GRACE: Duration = Duration::from_secs(5);

/// Connection settings for the hosted Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: Url,
    pub request_timeout: Duration,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: Url) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.as_str().trim_end_matches('/'),
            self.model
        )
    }
}

/// A handle to the Gemini-backed `LlmActor`.
///
/// This struct provides a public, cloneable interface for sending messages to the
/// running LLM actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct GeminiActorHandle {
    sender: mpsc::Sender<LlmMessage>,
    wait_limit: Duration,
}

impl GeminiActorHandle {
    /// Creates a new actor and returns a handle to it.
    ///
    /// This will spawn the `GeminiActorRunner` in a new Tokio task, so it must be
    /// called from within a Tokio runtime.
    pub fn new(settings: GeminiSettings) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let wait_limit = settings.request_timeout + RESPONDER_GRACE;
        let actor = GeminiActorRunner::new(receiver, settings);
        tokio::spawn(async move { actor.run().await });
        Self { sender, wait_limit }
    }

    /// A convenience method for generating text with default parameters.
    pub async fn generate(&self, prompt: String) -> Result<String, AppError> {
        self.generate_with_params(prompt, None, None).await
    }
}

#[async_trait]
impl LlmActor for GeminiActorHandle {
    async fn generate_with_params(
        &self,
        prompt: String,
        system_prompt: Option<String>,
        temperature: Option<f32>,
    ) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = LlmMessage::GenerateWithParams {
            prompt,
            system_prompt,
            temperature,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|e| ActorError::Internal(e.to_string()))?;
        timeout(self.wait_limit, recv)
            .await
            .map_err(ActorError::from)?
            .map_err(|e| ActorError::Internal(e.to_string()))?
    }
}

// --- Wire format ---
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateRequest {
    fn new(prompt: String, system_prompt: Option<String>, temperature: Option<f32>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: system_prompt.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: temperature.map(|temperature| GenerationConfig { temperature }),
        }
    }
}

// --- Actor Runner (Internal Logic) ---
struct GeminiActorRunner {
    receiver: mpsc::Receiver<LlmMessage>,
    client: GeminiClient,
}

/// Stateless HTTP side of the actor; cloned into one task per request.
#[derive(Clone)]
struct GeminiClient {
    http: Client,
    settings: GeminiSettings,
}

impl GeminiActorRunner {
    fn new(receiver: mpsc::Receiver<LlmMessage>, settings: GeminiSettings) -> Self {
        Self {
            receiver,
            client: GeminiClient {
                http: Client::new(),
                settings,
            },
        }
    }

    async fn run(mut self) {
        info!(model = %self.client.settings.model, "LlmActor started");

        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg);
        }

        info!("LlmActor stopped");
    }

    fn handle_message(&self, msg: LlmMessage) {
        match msg {
            LlmMessage::GenerateWithParams {
                prompt,
                system_prompt,
                temperature,
                responder,
            } => {
                let client = self.client.clone();
                tokio::spawn(async move {
                    let result = client
                        .generate_content(prompt, system_prompt, temperature)
                        .await;
                    let _ = responder.send(result);
                });
            }
        }
    }
}

impl GeminiClient {
    async fn generate_content(
        &self,
        prompt: String,
        system_prompt: Option<String>,
        temperature: Option<f32>,
    ) -> Result<String, AppError> {
        debug!(prompt_chars = prompt.len(), "LLM generating");

        let payload = GenerateRequest::new(prompt, system_prompt, temperature);
        let request_future = self
            .http
            .post(self.settings.endpoint())
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&payload)
            .send();

        let res = timeout(self.settings.request_timeout, request_future)
            .await
            .map_err(ActorError::from)??;

        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ActorError::LlmError(format!(
                "Completion request failed with status {}: {}",
                status, body
            ))
            .into());
        }

        let body: GenerateResponse = res
            .json()
            .await
            .map_err(|e| ActorError::MalformedResponse(e.to_string()))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ActorError::MalformedResponse("empty candidate list".to_string()).into());
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handle_for(server: &MockServer) -> GeminiActorHandle {
        let base = Url::parse(&server.uri()).unwrap();
        GeminiActorHandle::new(
            GeminiSettings::new("test-key", "gemini-test", base)
                .with_request_timeout(Duration::from_secs(2)),
        )
    }

    #[tokio::test]
    async fn test_generate_content_success() {
        // 1. Arrange
        let mock_server = MockServer::start().await;
        let handle = handle_for(&mock_server);

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"parts": [{"text": "Hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "This is a test response."}]}}]
            })))
            .mount(&mock_server)
            .await;

        // 2. Act
        let result = handle.generate("Hello".to_string()).await;

        // 3. Assert
        assert_eq!(result.unwrap(), "This is a test response.");
    }

    #[tokio::test]
    async fn test_generate_content_server_error() {
        let mock_server = MockServer::start().await;
        let handle = handle_for(&mock_server);

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let result = handle.generate("Hello".to_string()).await;

        if let Err(AppError::Actor(ActorError::LlmError(err_msg))) = result {
            assert!(err_msg.contains("Completion request failed with status 500"));
            assert!(err_msg.contains("Internal Server Error"));
        } else {
            panic!("Expected ActorError::LlmError, got {:?}", result);
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_are_malformed() {
        let mock_server = MockServer::start().await;
        let handle = handle_for(&mock_server);

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&mock_server)
            .await;

        let result = handle.generate("Hello".to_string()).await;
        assert!(matches!(
            result,
            Err(AppError::Actor(ActorError::MalformedResponse(_)))
        ));
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest::new("p".into(), Some("sys".into()), Some(0.2));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(value["generationConfig"]["temperature"].is_number());
        assert!(value["systemInstruction"].get("role").is_none());
    }
}
