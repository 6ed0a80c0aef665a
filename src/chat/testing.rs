//! Mock implementations for testing
//!
//! Scripted model and tool server, so sessions run without real I/O.

use crate::llm::{
    LlmError, LlmResponse, Message, ModelAdapter, SamplingRequest, SamplingResult, ToolCatalog,
    ToolDefinition, ToolResult,
};
use crate::mcp::protocol::{INVALID_PARAMS, METHOD_NOT_FOUND};
use crate::mcp::{McpError, ToolServer};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// Mock Model
// ============================================================================

/// One recorded `chat` call
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub history: Vec<Message>,
    pub with_tools: bool,
}

/// Model adapter that returns queued responses
pub struct MockModel {
    responses: Mutex<VecDeque<Result<Option<LlmResponse>, LlmError>>>,
    sample_text: Option<String>,
    /// Record of all chat requests made
    pub requests: Mutex<Vec<ChatRequest>>,
    /// Record of all sampling requests made
    pub samples: Mutex<Vec<SamplingRequest>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            sample_text: None,
            requests: Mutex::new(Vec::new()),
            samples: Mutex::new(Vec::new()),
        }
    }

    /// Answer sampling requests with fixed text
    pub fn with_sample_text(mut self, text: impl Into<String>) -> Self {
        self.sample_text = Some(text.into());
        self
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(Some(response)));
    }

    /// Queue an absent response (transient backend failure)
    pub fn queue_none(&self) {
        self.responses.lock().unwrap().push_back(Ok(None));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded chat requests
    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Get recorded sampling requests
    pub fn recorded_samples(&self) -> Vec<SamplingRequest> {
        self.samples.lock().unwrap().clone()
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelAdapter for MockModel {
    async fn chat(
        &self,
        history: &[Message],
        tools: Option<&ToolCatalog>,
    ) -> Result<Option<LlmResponse>, LlmError> {
        self.requests.lock().unwrap().push(ChatRequest {
            history: history.to_vec(),
            with_tools: tools.is_some(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    async fn sample(&self, request: &SamplingRequest) -> Result<SamplingResult, LlmError> {
        self.samples.lock().unwrap().push(request.clone());
        match &self.sample_text {
            Some(text) => Ok(SamplingResult {
                model: self.model_id().to_string(),
                text: text.clone(),
            }),
            None => Err(LlmError::unknown("No mock sample text")),
        }
    }

    fn tools_for_backend(&self, catalog: &ToolCatalog) -> Value {
        json!(catalog.iter().map(|t| t.name.clone()).collect::<Vec<_>>())
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// Mock Tool Server
// ============================================================================

enum ToolBehavior {
    Output(String),
    TransportFailure,
}

/// Tool server with predefined tool outputs and prompt templates
pub struct MockToolServer {
    tools: Vec<(String, ToolBehavior)>,
    prompts: BTreeMap<String, Option<String>>,
    prompt_failure: bool,
    catalog_failure: bool,
    /// Record of tool calls
    pub calls: Mutex<Vec<(String, Map<String, Value>)>>,
    /// Record of resolved prompt names
    pub prompt_runs: Mutex<Vec<String>>,
    list_tools_count: AtomicUsize,
}

impl MockToolServer {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            prompts: BTreeMap::new(),
            prompt_failure: false,
            catalog_failure: false,
            calls: Mutex::new(Vec::new()),
            prompt_runs: Mutex::new(Vec::new()),
            list_tools_count: AtomicUsize::new(0),
        }
    }

    /// Add a tool returning `text` as its single content item
    pub fn with_tool_output(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.tools
            .push((name.into(), ToolBehavior::Output(text.into())));
        self
    }

    /// Add a tool whose calls fail at the transport level
    pub fn with_transport_failure(mut self, name: impl Into<String>) -> Self {
        self.tools.push((name.into(), ToolBehavior::TransportFailure));
        self
    }

    /// Add a prompt template
    pub fn with_prompt(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.prompts.insert(name.into(), Some(text.into()));
        self
    }

    /// Add a prompt that resolves to no messages
    pub fn with_empty_prompt(mut self, name: impl Into<String>) -> Self {
        self.prompts.insert(name.into(), None);
        self
    }

    /// Make every prompt operation fail at the transport level
    pub fn with_prompt_failure(mut self) -> Self {
        self.prompt_failure = true;
        self
    }

    /// Make `list_tools` fail at the transport level
    pub fn with_catalog_failure(mut self) -> Self {
        self.catalog_failure = true;
        self
    }

    /// Get recorded tool calls
    pub fn recorded_calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Get recorded prompt resolutions
    pub fn recorded_prompt_runs(&self) -> Vec<String> {
        self.prompt_runs.lock().unwrap().clone()
    }

    /// Number of `list_tools` calls made
    pub fn list_tools_count(&self) -> usize {
        self.list_tools_count.load(Ordering::SeqCst)
    }

    /// Total remote operations of any kind
    pub fn remote_calls(&self) -> usize {
        self.list_tools_count() + self.calls.lock().unwrap().len() + self.recorded_prompt_runs().len()
    }
}

impl Default for MockToolServer {
    fn default() -> Self {
        Self::new()
    }
}

fn closed_pipe() -> McpError {
    McpError::Io(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        "mock transport failure",
    ))
}

#[async_trait]
impl ToolServer for MockToolServer {
    async fn list_tools(&self) -> Result<ToolCatalog, McpError> {
        self.list_tools_count.fetch_add(1, Ordering::SeqCst);
        if self.catalog_failure {
            return Err(closed_pipe());
        }
        Ok(ToolCatalog::new(self.tools.iter().map(|(name, _)| {
            ToolDefinition {
                name: name.clone(),
                description: format!("Mock {name}"),
                input_schema: json!({ "type": "object", "properties": {} }),
            }
        })))
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ToolResult, McpError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        match self.tools.iter().find(|(n, _)| n == name) {
            Some((_, ToolBehavior::Output(text))) => {
                Ok(ToolResult::from_texts(name, std::slice::from_ref(text)))
            }
            Some((_, ToolBehavior::TransportFailure)) => Err(closed_pipe()),
            None => Err(McpError::Rpc {
                code: METHOD_NOT_FOUND,
                message: format!("Unknown tool: {name}"),
            }),
        }
    }

    async fn list_prompts(&self) -> Result<Vec<String>, McpError> {
        if self.prompt_failure {
            return Err(closed_pipe());
        }
        Ok(self.prompts.keys().cloned().collect())
    }

    async fn run_prompt(
        &self,
        name: &str,
        _arguments: &BTreeMap<String, String>,
    ) -> Result<Option<String>, McpError> {
        self.prompt_runs.lock().unwrap().push(name.to_string());
        if self.prompt_failure {
            return Err(closed_pipe());
        }
        self.prompts
            .get(name)
            .cloned()
            .ok_or_else(|| McpError::Rpc {
                code: INVALID_PARAMS,
                message: format!("Unknown prompt: {name}"),
            })
    }
}
