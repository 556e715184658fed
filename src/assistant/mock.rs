//! Mock completion backend.

use super::chat::{ChatMessage, ToolSpec};
use super::{ChatCompleter, ChatError};
use async_trait::async_trait;

/// Canned-answer backend, used when no API key is configured and in tests.
pub struct MockChat {
    answer: String,
}

impl MockChat {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

impl Default for MockChat {
    fn default() -> Self {
        Self::new(
            "The statistics assistant is not configured. Set OPENAI_API_KEY to enable live answers.",
        )
    }
}

#[async_trait]
impl ChatCompleter for MockChat {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> Result<ChatMessage, ChatError> {
        Ok(ChatMessage::assistant(self.answer.clone()))
    }
}
