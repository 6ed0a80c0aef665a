//! Model adapter abstraction
//!
//! The orchestrator talks to the generative model only through
//! [`ModelAdapter`]; [`GeminiAdapter`] is the one concrete binding.

mod error;
mod gemini;
mod schema;
mod types;

#[cfg(test)]
mod proptests;

pub use error::{LlmError, LlmErrorKind};
pub use gemini::GeminiAdapter;
pub use schema::{clean_schema, contains_title};
pub use types::*;

use crate::mcp::{SamplingHandler, ToolServer};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Capability contract of a generative-model backend
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Send the whole history, optionally advertising `tools`.
    ///
    /// `Ok(None)` signals a classified transient backend failure, letting the
    /// caller abandon the turn instead of failing the session.
    async fn chat(
        &self,
        history: &[Message],
        tools: Option<&ToolCatalog>,
    ) -> Result<Option<LlmResponse>, LlmError>;

    /// Ad-hoc completion on behalf of the tool server
    async fn sample(&self, request: &SamplingRequest) -> Result<SamplingResult, LlmError>;

    /// Translate a catalog into the backend's tool schema dialect
    fn tools_for_backend(&self, catalog: &ToolCatalog) -> Value;

    /// Get the model ID
    fn model_id(&self) -> &str;

    /// Plain text of the first candidate; empty for anything unusable
    fn extract_text(&self, response: Option<&LlmResponse>) -> String {
        response
            .and_then(LlmResponse::content)
            .map(Message::text)
            .unwrap_or_default()
    }

    /// Pure append. Keeping invalid responses out is the caller's job.
    fn append_to_history(&self, history: &mut Vec<Message>, message: Message) {
        history.push(message);
    }

    /// Ask a single question inside `history`, without tools.
    ///
    /// The question and the model's text answer are appended together, or
    /// not at all: an absent response, an empty answer or an error leaves
    /// `history` as it was.
    async fn ask(&self, question: &str, history: &mut Vec<Message>) -> Result<String, LlmError> {
        self.append_to_history(history, Message::user_text(question));

        let response = match self.chat(history.as_slice(), None).await {
            Ok(response) => response,
            Err(e) => {
                history.pop();
                return Err(e);
            }
        };

        let text = self.extract_text(response.as_ref());
        if text.is_empty() {
            history.pop();
        } else {
            self.append_to_history(history, Message::model_text(text.clone()));
        }
        Ok(text)
    }

    /// Run every tool call in `response` through `proxy`, one result part per call
    async fn execute_tool_calls(&self, proxy: &dyn ToolServer, response: &LlmResponse) -> Vec<Part> {
        execute_tool_calls(proxy, response).await
    }
}

/// Execute the response's tool calls sequentially, in request order.
///
/// A transport failure on one call becomes an error payload for that call;
/// the batch always yields exactly one part per request.
pub async fn execute_tool_calls(proxy: &dyn ToolServer, response: &LlmResponse) -> Vec<Part> {
    let mut parts = Vec::new();
    for call in response.tool_invocations() {
        let arguments = Value::Object(call.arguments.clone());
        tracing::info!(tool = %call.name, %arguments, "Calling tool");
        let result = match proxy.call_tool(&call.name, &call.arguments).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                ToolResult::error(&call.name, e)
            }
        };
        parts.push(Part::function_response(result));
    }
    parts
}

#[async_trait]
impl<T: ModelAdapter + ?Sized> SamplingHandler for T {
    async fn create_message(&self, request: SamplingRequest) -> Result<SamplingResult, LlmError> {
        tracing::info!(messages = request.messages.len(), "Server requested sampling");
        self.sample(&request).await
    }
}

/// Logging wrapper for model adapters
pub struct LoggingAdapter {
    inner: Arc<dyn ModelAdapter>,
    model_id: String,
}

impl LoggingAdapter {
    pub fn new(inner: Arc<dyn ModelAdapter>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl ModelAdapter for LoggingAdapter {
    async fn chat(
        &self,
        history: &[Message],
        tools: Option<&ToolCatalog>,
    ) -> Result<Option<LlmResponse>, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.chat(history, tools).await;
        let duration = start.elapsed();

        match &result {
            Ok(Some(response)) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = history.len(),
                    tools = tools.map_or(0, ToolCatalog::len),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    tool_calls = response.tool_invocations().len(),
                    "Model request completed"
                );
            }
            Ok(None) => {
                tracing::warn!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    "Model request returned no response"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "Model request failed"
                );
            }
        }

        result
    }

    async fn sample(&self, request: &SamplingRequest) -> Result<SamplingResult, LlmError> {
        let result = self.inner.sample(request).await;
        if let Err(e) = &result {
            tracing::error!(model = %self.model_id, error = %e.message, "Sampling request failed");
        }
        result
    }

    fn tools_for_backend(&self, catalog: &ToolCatalog) -> Value {
        self.inner.tools_for_backend(catalog)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn extract_text(&self, response: Option<&LlmResponse>) -> String {
        self.inner.extract_text(response)
    }

    fn append_to_history(&self, history: &mut Vec<Message>, message: Message) {
        self.inner.append_to_history(history, message);
    }

    async fn execute_tool_calls(&self, proxy: &dyn ToolServer, response: &LlmResponse) -> Vec<Part> {
        self.inner.execute_tool_calls(proxy, response).await
    }
}
