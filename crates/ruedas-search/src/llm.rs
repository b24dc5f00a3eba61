//! Language-model text service.
//!
//! Every pipeline stage that consults a model goes through the
//! [`LanguageModel`] trait and [`complete_within`], which enforces the
//! stage's deadline. When the deadline passes, the in-flight future is
//! dropped, and with it the underlying HTTP request.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::LlmConfig;
use crate::error::LlmError;

/// Who a chat message is from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A role-tagged message sequence plus generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the service to return a single JSON object.
    pub json_output: bool,
}

impl ChatRequest {
    /// A system prompt followed by one user message.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: 0.0,
            max_tokens: 500,
            json_output: false,
        }
    }

    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub const fn json(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Text of the last user message.
    pub fn user_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map_or("", |m| m.content.as_str())
    }
}

/// A service that turns a chat request into text.
#[async_trait]
pub trait LanguageModel: Send + Sync + fmt::Debug {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

/// Run a model call under a hard deadline.
///
/// On expiry the call's future is dropped, which aborts the request.
pub async fn complete_within(
    model: &dyn LanguageModel,
    request: &ChatRequest,
    deadline: Duration,
) -> Result<String, LlmError> {
    match tokio::time::timeout(deadline, model.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout(deadline.as_millis() as u64)),
    }
}

/// Remove a Markdown code fence the model may have wrapped its answer in.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

// ---------------------------------------------------------------------------
// OpenAI-compatible chat completions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let http = Client::builder()
            .user_agent(concat!("ruedas/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if request.json_output {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| LlmError::Http {
                model: self.model.clone(),
                message: e.to_string(),
            })?;

        let parsed: CompletionResponse = response.json().await.map_err(|e| LlmError::Parse {
            model: self.model.clone(),
            message: e.to_string(),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::Parse {
                model: self.model.clone(),
                message: "response had no message content".to_string(),
            })
    }
}

/// Stand-in used when no model is configured; every call fails fast.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledModel;

#[async_trait]
impl LanguageModel for DisabledModel {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
        Err(LlmError::Disabled)
    }
}

/// Build the model described by the configuration.
///
/// Without an API key the pipeline runs on its deterministic paths only.
pub fn from_config(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>, LlmError> {
    match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            log::info!("Using language model {} at {}", config.model, config.base_url);
            Ok(Arc::new(OpenAiClient::new(
                &config.base_url,
                key,
                &config.model,
            )?))
        }
        _ => {
            log::info!("No API key configured; language model disabled");
            Ok(Arc::new(DisabledModel))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct SlowModel;

    #[async_trait]
    impl LanguageModel for SlowModel {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".to_string())
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"b\": 2} "), "{\"b\": 2}");
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new("sys", "hello").json().max_tokens(150);
        assert!(request.json_output);
        assert_eq!(request.max_tokens, 150);
        assert_eq!(request.user_text(), "hello");
        assert_eq!(request.messages[0].role, Role::System);
    }

    #[test]
    fn test_messages_serialize_with_lowercase_roles() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[tokio::test]
    async fn test_complete_within_times_out() {
        let request = ChatRequest::new("sys", "hello");
        let err = complete_within(&SlowModel, &request, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_disabled_model_fails() {
        let request = ChatRequest::new("sys", "hello");
        let err = DisabledModel.complete(&request).await.unwrap_err();
        assert!(matches!(err, LlmError::Disabled));
    }

    #[test]
    fn test_from_config_without_key_is_disabled() {
        let model = from_config(&LlmConfig::default()).unwrap();
        assert!(format!("{model:?}").contains("DisabledModel"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = OpenAiClient::new("https://example.test/v1/", "sk-secret", "m").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-secret"));
        assert_eq!(client.endpoint(), "https://example.test/v1/chat/completions");
    }
}
