//! OpenAI chat completions backend.

use super::chat::{ChatMessage, ToolSpec};
use super::{ChatCompleter, ChatError};
use crate::config::AssistantConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Chat completions backend talking to the OpenAI API (or any server exposing
/// the same wire format via `OPENAI_API_BASE`).
pub struct OpenAiChat {
    config: AssistantConfig,
    client: Client,
}

impl OpenAiChat {
    pub fn new(config: AssistantConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }
}

#[async_trait]
impl ChatCompleter for OpenAiChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatMessage, ChatError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ChatError::NotConfigured("OPENAI_API_KEY is not set".to_string()))?;

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            tools,
            tool_choice: "auto",
        };

        let url = format!("{}/chat/completions", self.config.api_base);

        tracing::debug!(
            model = %self.config.model,
            message_count = messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ChatError::RateLimited);
            }

            return Err(ChatError::ApiError(format!(
                "Chat completions error {}: {}",
                status, error_text
            )));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::ApiError(format!("Failed to parse response: {}", e)))?;

        // An empty choice list reads as an empty final answer.
        let message = api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .unwrap_or_else(|| ChatMessage::assistant(""));

        Ok(message)
    }
}

// ============================================================================
// Chat Completions API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: &'a [ToolSpec],
    tool_choice: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
    #[serde(default)]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}
