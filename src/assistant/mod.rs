//! Tool-calling statistics assistant.
//!
//! The assistant answers questions about live business numbers by driving a
//! chat completion backend through a bounded dispatch loop: each round the
//! model either answers in plain text (done) or requests reporting tools,
//! whose JSON results are appended to the conversation before the next round.
//! When the round budget runs out the caller gets a fixed fallback answer
//! instead of an error.

mod chat;
pub mod mock;
pub mod openai;
mod tools;

pub use chat::{ChatMessage, FunctionCall, FunctionSpec, ToolCall, ToolSpec};
pub use mock::MockChat;
pub use openai::OpenAiChat;

use crate::error::AppError;
use crate::services::metrics::{
    ASSISTANT_REQUESTS_TOTAL, ASSISTANT_REQUEST_DURATION, ASSISTANT_TOOL_CALLS_TOTAL,
};
use crate::services::reports::ReportSource;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tools::ReportingTool;

const SYSTEM_PROMPT: &str = "You are a POS statistics assistant. Use tools to fetch live numbers. Never invent numbers. If data is insufficient, say so.";

/// Error type for completion backends.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Completion backend not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        AppError::BadGateway(err.to_string())
    }
}

/// One completion round against a chat backend.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatMessage, ChatError>;
}

/// The statistics assistant.
pub struct Assistant {
    chat: Arc<dyn ChatCompleter>,
    reports: Arc<dyn ReportSource>,
    max_rounds: u32,
    fallback_answer: String,
}

impl Assistant {
    pub fn new(
        chat: Arc<dyn ChatCompleter>,
        reports: Arc<dyn ReportSource>,
        max_rounds: u32,
        fallback_answer: String,
    ) -> Self {
        Self {
            chat,
            reports,
            max_rounds,
            fallback_answer,
        }
    }

    /// Answer a question, running at most `max_rounds` completion rounds.
    pub async fn ask(&self, question: &str) -> Result<String, AppError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("Missing question")));
        }

        let timer = ASSISTANT_REQUEST_DURATION.start_timer();
        let result = self.run_rounds(question).await;
        timer.observe_duration();

        match result {
            Ok(Some(answer)) => {
                ASSISTANT_REQUESTS_TOTAL
                    .with_label_values(&["answered"])
                    .inc();
                Ok(answer)
            }
            Ok(None) => {
                ASSISTANT_REQUESTS_TOTAL
                    .with_label_values(&["fallback"])
                    .inc();
                tracing::warn!(
                    max_rounds = self.max_rounds,
                    "Round budget exhausted without a final answer"
                );
                Ok(self.fallback_answer.clone())
            }
            Err(e) => {
                ASSISTANT_REQUESTS_TOTAL.with_label_values(&["error"]).inc();
                Err(e)
            }
        }
    }

    /// The dispatch loop. `Ok(None)` means the round budget ran out.
    async fn run_rounds(&self, question: &str) -> Result<Option<String>, AppError> {
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(question)];
        let tools = tools::catalog();

        for round in 0..self.max_rounds {
            let reply = self.chat.complete(&messages, &tools).await.map_err(|e| {
                tracing::error!(error = %e, round = round, "Completion request failed");
                AppError::from(e)
            })?;

            let calls = match &reply.tool_calls {
                Some(calls) if !calls.is_empty() => calls.clone(),
                _ => return Ok(Some(reply.content.unwrap_or_default())),
            };

            tracing::debug!(round = round, call_count = calls.len(), "Model requested tools");

            // Push the assistant turn first, then one tool result per call,
            // in the order the model asked for them.
            let mut turn = reply;
            turn.content = Some(turn.content.unwrap_or_default());
            messages.push(turn);

            for call in calls {
                let payload = self.run_tool(&call).await?;
                messages.push(ChatMessage::tool(call.id, payload));
            }
        }

        Ok(None)
    }

    /// Execute one tool call and render the JSON payload fed back to the model.
    async fn run_tool(&self, call: &ToolCall) -> Result<String, AppError> {
        let tool = match ReportingTool::from_name(&call.function.name) {
            Some(tool) => tool,
            None => {
                // An unknown name is answered inline so the model can recover.
                tracing::warn!(tool = %call.function.name, "Model requested an unknown tool");
                return Ok(
                    json!({ "error": format!("Unknown tool: {}", call.function.name) }).to_string(),
                );
            }
        };

        ASSISTANT_TOOL_CALLS_TOTAL
            .with_label_values(&[tool.name()])
            .inc();

        let raw = call.function.arguments.trim();
        let args: serde_json::Value = if raw.is_empty() {
            json!({})
        } else {
            serde_json::from_str(raw).map_err(|e| {
                AppError::BadGateway(format!(
                    "Malformed arguments for tool {}: {}",
                    call.function.name, e
                ))
            })?
        };

        let payload = tool.dispatch(self.reports.as_ref(), &args).await?;
        Ok(payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reports::{
        CategoryReport, CoffeeSoldReport, OrdersCountReport, RevenueReport,
    };
    use rust_decimal::Decimal;
    use std::collections::VecDeque;
    use std::str::FromStr;
    use std::sync::Mutex;

    /// Backend that replays a fixed script and records every request.
    struct ScriptedChat {
        script: Mutex<VecDeque<ChatMessage>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedChat {
        fn new(turns: Vec<ChatMessage>) -> Self {
            Self {
                script: Mutex::new(turns.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn rounds_run(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn request(&self, round: usize) -> Vec<ChatMessage> {
            self.seen.lock().unwrap()[round].clone()
        }
    }

    #[async_trait]
    impl ChatCompleter for ScriptedChat {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolSpec],
        ) -> Result<ChatMessage, ChatError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            // Out of script means keep asking for tools, which exercises the
            // round budget.
            Ok(self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| tool_turn("call_loop", "get_revenue_today", "{}")))
        }
    }

    #[derive(Default)]
    struct StubReports {
        calls: Mutex<Vec<String>>,
    }

    impl StubReports {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl crate::services::reports::ReportSource for StubReports {
        async fn orders_count_today(&self) -> Result<OrdersCountReport, AppError> {
            self.calls.lock().unwrap().push("orders_count".to_string());
            Ok(OrdersCountReport {
                date: "today".to_string(),
                timezone: "UTC".to_string(),
                orders_count: 3,
            })
        }

        async fn revenue_today(&self) -> Result<RevenueReport, AppError> {
            self.calls.lock().unwrap().push("revenue".to_string());
            Ok(RevenueReport {
                date: "today".to_string(),
                timezone: "UTC".to_string(),
                revenue: Decimal::from_str("125.00").unwrap(),
            })
        }

        async fn coffee_sold_today(&self) -> Result<CoffeeSoldReport, AppError> {
            self.calls.lock().unwrap().push("coffee".to_string());
            Ok(CoffeeSoldReport {
                date: "today".to_string(),
                timezone: "UTC".to_string(),
                coffees_sold: 12,
            })
        }

        async fn products_by_category(&self, category: &str) -> Result<CategoryReport, AppError> {
            self.calls.lock().unwrap().push(format!("products:{}", category));
            Ok(CategoryReport {
                category: category.to_string(),
                count: 0,
                products: Vec::new(),
            })
        }
    }

    fn tool_turn(id: &str, name: &str, arguments: &str) -> ChatMessage {
        ChatMessage {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(vec![ToolCall {
                id: id.to_string(),
                kind: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            }]),
            tool_call_id: None,
        }
    }

    fn assistant_with(
        script: Vec<ChatMessage>,
    ) -> (Assistant, Arc<ScriptedChat>, Arc<StubReports>) {
        let chat = Arc::new(ScriptedChat::new(script));
        let reports = Arc::new(StubReports::default());
        let assistant = Assistant::new(
            chat.clone(),
            reports.clone(),
            5,
            "Unable to complete the request.".to_string(),
        );
        (assistant, chat, reports)
    }

    #[tokio::test]
    async fn test_plain_answer_ends_after_one_round() {
        let (assistant, chat, reports) =
            assistant_with(vec![ChatMessage::assistant("We sold 12 coffees today.")]);

        let answer = assistant.ask("how many coffees?").await.unwrap();

        assert_eq!(answer, "We sold 12 coffees today.");
        assert_eq!(chat.rounds_run(), 1);
        assert!(reports.calls().is_empty());

        // First request carries exactly the system prompt plus the question.
        let request = chat.request(0);
        assert_eq!(request.len(), 2);
        assert_eq!(request[0].role, "system");
        assert_eq!(request[1].role, "user");
        assert_eq!(request[1].content.as_deref(), Some("how many coffees?"));
    }

    #[tokio::test]
    async fn test_tool_round_appends_assistant_turn_then_results() {
        let (assistant, chat, reports) = assistant_with(vec![
            tool_turn("call_1", "get_revenue_today", "{}"),
            ChatMessage::assistant("Revenue today is 125.00."),
        ]);

        let answer = assistant.ask("revenue today?").await.unwrap();

        assert_eq!(answer, "Revenue today is 125.00.");
        assert_eq!(chat.rounds_run(), 2);
        assert_eq!(reports.calls(), vec!["revenue".to_string()]);

        // Second request: system, user, assistant tool request, tool result.
        let request = chat.request(1);
        assert_eq!(request.len(), 4);
        assert_eq!(request[2].role, "assistant");
        assert_eq!(request[2].content.as_deref(), Some(""));
        assert!(request[2].tool_calls.is_some());
        assert_eq!(request[3].role, "tool");
        assert_eq!(request[3].tool_call_id.as_deref(), Some("call_1"));
        let payload = request[3].content.as_deref().unwrap();
        assert!(payload.contains("\"revenue\""), "payload was {}", payload);
    }

    #[tokio::test]
    async fn test_round_budget_yields_fallback_answer() {
        // Empty script: every round asks for another tool.
        let (assistant, chat, _reports) = assistant_with(vec![]);

        let answer = assistant.ask("loop forever").await.unwrap();

        assert_eq!(answer, "Unable to complete the request.");
        assert_eq!(chat.rounds_run(), 5);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_answered_inline() {
        let (assistant, chat, reports) = assistant_with(vec![
            tool_turn("call_9", "get_weather", "{}"),
            ChatMessage::assistant("I cannot help with that."),
        ]);

        let answer = assistant.ask("weather?").await.unwrap();

        assert_eq!(answer, "I cannot help with that.");
        assert!(reports.calls().is_empty());

        let request = chat.request(1);
        assert_eq!(
            request[3].content.as_deref(),
            Some(r#"{"error":"Unknown tool: get_weather"}"#)
        );
    }

    #[tokio::test]
    async fn test_empty_arguments_are_treated_as_no_arguments() {
        let (assistant, _chat, reports) = assistant_with(vec![
            tool_turn("call_2", "list_products_by_category", ""),
            ChatMessage::assistant("No category given."),
        ]);

        assistant.ask("list products").await.unwrap();

        // Missing category falls back to the empty string, matching nothing.
        assert_eq!(reports.calls(), vec!["products:".to_string()]);
    }

    #[tokio::test]
    async fn test_category_argument_is_passed_through() {
        let (assistant, _chat, reports) = assistant_with(vec![
            tool_turn("call_3", "list_products_by_category", r#"{"category":"Tea"}"#),
            ChatMessage::assistant("Two teas."),
        ]);

        assistant.ask("teas?").await.unwrap();

        assert_eq!(reports.calls(), vec!["products:Tea".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_arguments_abort_the_request() {
        let (assistant, _chat, reports) = assistant_with(vec![tool_turn(
            "call_4",
            "list_products_by_category",
            "{not json",
        )]);

        let err = assistant.ask("teas?").await.unwrap_err();

        assert!(matches!(err, AppError::BadGateway(_)));
        assert!(reports.calls().is_empty());
    }

    #[tokio::test]
    async fn test_backend_error_propagates_as_bad_gateway() {
        struct FailingChat;

        #[async_trait]
        impl ChatCompleter for FailingChat {
            async fn complete(
                &self,
                _messages: &[ChatMessage],
                _tools: &[ToolSpec],
            ) -> Result<ChatMessage, ChatError> {
                Err(ChatError::ApiError("boom".to_string()))
            }
        }

        let assistant = Assistant::new(
            Arc::new(FailingChat),
            Arc::new(StubReports::default()),
            5,
            "Unable to complete the request.".to_string(),
        );

        let err = assistant.ask("anything").await.unwrap_err();
        assert!(matches!(err, AppError::BadGateway(_)));
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected_without_a_round() {
        let (assistant, chat, _reports) = assistant_with(vec![]);

        let err = assistant.ask("   ").await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(chat.rounds_run(), 0);
    }

    #[tokio::test]
    async fn test_empty_content_answer_is_returned_as_empty_string() {
        let (assistant, _chat, _reports) = assistant_with(vec![ChatMessage {
            role: "assistant".to_string(),
            content: None,
            tool_calls: None,
            tool_call_id: None,
        }]);

        let answer = assistant.ask("anything").await.unwrap();
        assert_eq!(answer, "");
    }
}
