use super::prompt::{estimate_tokens, summary_messages, ChatMessage, MAX_ESTIMATED_TOKENS};
use super::service::{classify_failure, DocumentationService};
use crate::error::ServiceError;
use crate::spec::{EndpointDescriptor, SchemaInfo};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Completion budget for an endpoint summary.
pub const SUMMARY_MAX_TOKENS: u32 = 2500;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

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
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions API.
///
/// Used directly as a [`DocumentationService`] (no intermediate summarize
/// endpoint) and by [`ChatSession`](crate::chat::ChatSession).
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one chat completion and return the first choice's text.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens,
        };
        debug!(model = %self.model, messages = messages.len(), max_tokens, "Requesting chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let envelope: ErrorEnvelope = response.json().await.unwrap_or_default();
            let detail = envelope.error.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                code = detail.code.as_deref().unwrap_or(""),
                "Chat completion failed"
            );
            return Err(classify_failure(status, detail.message, detail.code.as_deref()));
        }

        let body: CompletionResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::MalformedResponse("completion has no content".to_string()))
    }
}

#[async_trait]
impl DocumentationService for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn summarize(
        &self,
        endpoint: &EndpointDescriptor,
        schema_info: &SchemaInfo,
    ) -> Result<String, ServiceError> {
        let estimated_tokens = estimate_tokens(endpoint);
        if estimated_tokens > MAX_ESTIMATED_TOKENS {
            warn!(endpoint = %endpoint.key(), estimated_tokens, "Endpoint too large to summarize");
            return Err(ServiceError::PayloadTooLarge { estimated_tokens });
        }
        let messages = summary_messages(endpoint, schema_info);
        self.complete(&messages, SUMMARY_MAX_TOKENS).await
    }
}
