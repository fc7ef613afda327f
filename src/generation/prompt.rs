//! Chat prompt construction for the direct OpenAI backend.

use crate::spec::{EndpointDescriptor, SchemaInfo};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// System message of every endpoint summary request.
pub const SYSTEM_PROMPT: &str = "You are an expert API technical writer who excels at explaining complex APIs in clear, beginner-friendly terms.";

/// Requests estimated above this many tokens are refused before sending.
pub const MAX_ESTIMATED_TOKENS: usize = 6000;

/// Fixed allowance for prompt scaffolding and the completion.
const BASE_TOKENS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat-completions message.
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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Rough token count: a quarter of the serialized endpoint plus [`BASE_TOKENS`].
pub fn estimate_tokens(endpoint: &EndpointDescriptor) -> usize {
    let len = serde_json::to_string(endpoint).map_or(0, |s| s.len());
    len.div_ceil(4) + BASE_TOKENS
}

/// The user message asking for one endpoint's documentation.
pub fn build_user_prompt(endpoint: &EndpointDescriptor, schema_info: &SchemaInfo) -> String {
    let mut prompt =
        String::from("Please analyze this API endpoint and provide a comprehensive explanation:\n\n");

    let context: Vec<String> = [
        schema_info.title.as_ref().map(|t| format!("API: {t}")),
        schema_info.version.as_ref().map(|v| format!("Version: {v}")),
        schema_info.base_url.as_ref().map(|u| format!("Base URL: {u}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !context.is_empty() {
        prompt.push_str(&context.join("\n"));
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!("Path: {}\nMethod: {}\n", endpoint.path, endpoint.method));
    if let Some(summary) = &endpoint.summary {
        prompt.push_str(&format!("Summary: {summary}\n"));
    }
    if let Some(description) = &endpoint.description {
        prompt.push_str(&format!("Description: {description}\n"));
    }

    let details = json!({
        "parameters": endpoint.parameters,
        "requestBody": endpoint.request_body,
        "responses": endpoint.responses,
    });
    let details = serde_json::to_string_pretty(&details).unwrap_or_default();
    prompt.push_str(&format!("\nTechnical Details:\n{details}\n\n"));
    prompt.push_str(
        "Please format your response with clear sections explaining what this endpoint does, \
         how to use it, and provide practical examples.",
    );
    prompt
}

/// System and user messages for one endpoint.
pub fn summary_messages(endpoint: &EndpointDescriptor, schema_info: &SchemaInfo) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_user_prompt(endpoint, schema_info)),
    ]
}
