//! Conversational Q&A about a loaded schema.
//!
//! A [`ChatSession`] keeps the turn history and replays it, behind a system
//! message describing the API, on every question.

use crate::error::ServiceError;
use crate::generation::prompt::ChatMessage;
use crate::generation::OpenAiClient;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Completion budget for a chat answer.
pub const CHAT_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message is required")]
    EmptyMessage,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// System message describing the API in `schema`.
pub fn system_message(schema: &Value) -> String {
    let info = |field: &str, default: &str| {
        schema
            .pointer(&format!("/info/{field}"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string()
    };
    format!(
        "You are an API expert assistant. You help developers understand and use APIs effectively.\n\n\
         Available API Information:\n\
         Title: {}\n\
         Version: {}\n\
         Description: {}\n\n\
         You have access to the complete OpenAPI/Swagger schema for this API. When answering questions:\n\
         1. Be concise but thorough\n\
         2. Include relevant code examples when appropriate\n\
         3. Format code blocks with proper syntax highlighting\n\
         4. Focus on practical, real-world usage\n\
         5. Explain any authentication requirements\n\
         6. Highlight important parameters or requirements",
        info("title", "API"),
        info("version", "N/A"),
        info("description", "No description available"),
    )
}

pub struct ChatSession<'a> {
    client: &'a OpenAiClient,
    system: String,
    history: Vec<ChatMessage>,
}

impl<'a> ChatSession<'a> {
    pub fn new(client: &'a OpenAiClient, schema: &Value) -> Self {
        Self {
            client,
            system: system_message(schema),
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Messages sent for `message`: system, history, then the new question.
    pub fn request_messages(&self, message: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ChatMessage::system(self.system.clone()));
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(message));
        messages
    }

    /// Ask a question. Both turns are kept only if the call succeeds.
    pub async fn ask(&mut self, message: &str) -> Result<String, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let messages = self.request_messages(message);
        debug!(turns = self.history.len(), "Sending chat question");
        let answer = self.client.complete(&messages, CHAT_MAX_TOKENS).await?;
        self.history.push(ChatMessage::user(message));
        self.history.push(ChatMessage::assistant(answer.clone()));
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::prompt::Role;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_system_message_defaults() {
        let msg = system_message(&json!({"info": {"title": "Pets"}}));
        assert!(msg.contains("Title: Pets\n"));
        assert!(msg.contains("Version: N/A\n"));
        assert!(msg.contains("Description: No description available"));
        assert!(system_message(&json!({})).contains("Title: API\n"));
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected_without_call() {
        let client = OpenAiClient::new("sk-test", Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let mut session = ChatSession::new(&client, &json!({}));
        assert!(matches!(session.ask("   ").await, Err(ChatError::EmptyMessage)));
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_request_messages_order() {
        let client = OpenAiClient::new("sk-test", Duration::from_secs(1)).unwrap();
        let session = ChatSession::new(&client, &json!({}));
        let messages = session.request_messages("How do I list pets?");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1], ChatMessage::user("How do I list pets?"));
    }
}
