//! Stdio MCP client owning the tool server subprocess
//!
//! Lifecycle: `Unconnected → Connected → Closed`. `connect` spawns the server
//! and performs the `initialize` handshake; `cleanup` closes the session and
//! reaps the child. Closed is terminal.

use super::protocol::{
    CallToolParams, CallToolResult, Content, CreateMessageParams, CreateMessageResult,
    GetPromptParams, GetPromptResult, Implementation, InitializeResult, JsonRpcError,
    JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, ListPromptsResult, ListToolsResult,
    MessageKind, PROTOCOL_VERSION,
};
use super::{McpError, SamplingHandler, ToolServer};
use crate::llm::{
    Role, SamplingMessage, SamplingRequest, ToolCatalog, ToolDefinition, ToolResult,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Observable connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Unconnected,
    Connected,
    Closed,
}

enum ConnectionState {
    Unconnected,
    Connected(Session),
    Closed,
}

/// Live session with a spawned server
struct Session {
    child: Child,
    stdin: Mutex<Option<ChildStdin>>,
    stdout: Mutex<Lines<BufReader<ChildStdout>>>,
    next_id: AtomicU64,
}

impl Session {
    async fn send(&self, message: &impl Serialize) -> Result<(), McpError> {
        let line = serde_json::to_string(message)?;
        tracing::debug!("MCP → {}", line);

        let mut guard = self.stdin.lock().await;
        let stdin = guard
            .as_mut()
            .ok_or_else(|| McpError::Connection("Tool server input already closed".to_string()))?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Close stdin, give the server a moment to exit, then kill it
    async fn shutdown(mut self) {
        self.stdin.get_mut().take();

        match tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => tracing::info!(%status, "Tool server exited"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Failed to wait for tool server"),
            Err(_) => {
                tracing::warn!("Tool server did not exit, killing it");
                if let Err(e) = self.child.kill().await {
                    tracing::warn!(error = %e, "Failed to kill tool server");
                }
            }
        }
    }
}

/// Client for a tool server reached over the child's stdio
pub struct McpClient {
    command: String,
    args: Vec<String>,
    sampler: Option<Arc<dyn SamplingHandler>>,
    state: ConnectionState,
}

impl McpClient {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            sampler: None,
            state: ConnectionState::Unconnected,
        }
    }

    /// Answer server-initiated `sampling/createMessage` requests with `handler`
    pub fn with_sampling_handler(mut self, handler: Arc<dyn SamplingHandler>) -> Self {
        self.sampler = Some(handler);
        self
    }

    pub fn status(&self) -> ConnectionStatus {
        match self.state {
            ConnectionState::Unconnected => ConnectionStatus::Unconnected,
            ConnectionState::Connected(_) => ConnectionStatus::Connected,
            ConnectionState::Closed => ConnectionStatus::Closed,
        }
    }

    /// Spawn the server and complete the handshake.
    ///
    /// Only valid once, from `Unconnected`. A failed handshake reaps the child
    /// and leaves the client `Closed`.
    pub async fn connect(&mut self) -> Result<(), McpError> {
        match self.state {
            ConnectionState::Unconnected => {}
            ConnectionState::Connected(_) => {
                return Err(McpError::Connection("Already connected".to_string()));
            }
            ConnectionState::Closed => {
                return Err(McpError::Connection("Connection already closed".to_string()));
            }
        }

        tracing::info!(command = %self.command, args = ?self.args, "Spawning tool server");
        let session = match self.spawn() {
            Ok(session) => session,
            Err(e) => {
                self.state = ConnectionState::Closed;
                return Err(e);
            }
        };
        self.state = ConnectionState::Connected(session);

        if let Err(e) = self.initialize().await {
            tracing::error!(error = %e, "Tool server handshake failed");
            self.cleanup().await;
            return Err(McpError::Connection(format!("Handshake failed: {e}")));
        }
        Ok(())
    }

    fn spawn(&self) -> Result<Session, McpError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            McpError::Connection(format!("Failed to spawn tool server '{}': {e}", self.command))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Connection("Failed to get tool server stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Connection("Failed to get tool server stdout".to_string()))?;

        Ok(Session {
            child,
            stdin: Mutex::new(Some(stdin)),
            stdout: Mutex::new(BufReader::new(stdout).lines()),
            next_id: AtomicU64::new(1),
        })
    }

    async fn initialize(&self) -> Result<(), McpError> {
        let mut capabilities = json!({});
        if self.sampler.is_some() {
            capabilities["sampling"] = json!({});
        }
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": capabilities,
            "clientInfo": Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        });

        let result: InitializeResult = self.request("initialize", params).await?;
        if result.protocol_version != PROTOCOL_VERSION {
            tracing::warn!(
                server = %result.protocol_version,
                client = PROTOCOL_VERSION,
                "Protocol version mismatch"
            );
        }

        self.session()?
            .send(&JsonRpcRequest::notification("notifications/initialized"))
            .await?;

        tracing::info!(
            server = ?result.server_info.as_ref().map(|i| i.name.as_str()),
            "Tool server initialized"
        );
        Ok(())
    }

    /// Release the session and reap the subprocess. Safe in every state.
    pub async fn cleanup(&mut self) {
        let previous = std::mem::replace(&mut self.state, ConnectionState::Closed);
        if let ConnectionState::Connected(session) = previous {
            session.shutdown().await;
        }
    }

    fn session(&self) -> Result<&Session, McpError> {
        match &self.state {
            ConnectionState::Connected(session) => Ok(session),
            ConnectionState::Unconnected => Err(McpError::Connection(
                "Client session not initialized. Call connect first.".to_string(),
            )),
            ConnectionState::Closed => {
                Err(McpError::Connection("Connection to tool server is closed".to_string()))
            }
        }
    }

    /// Send a request and read until its response arrives, answering any
    /// server-initiated requests in between
    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, McpError> {
        let session = self.session()?;
        let id = session.next_id.fetch_add(1, Ordering::SeqCst);
        session
            .send(&JsonRpcRequest::request(id, method, params))
            .await?;

        let expected = Value::from(id);
        let mut stdout = session.stdout.lock().await;
        loop {
            let line = stdout.next_line().await?.ok_or_else(|| {
                McpError::Connection("Tool server closed stdout unexpectedly".to_string())
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            tracing::debug!("MCP ← {}", trimmed);

            let message: JsonRpcMessage = match serde_json::from_str(trimmed) {
                Ok(message) => message,
                Err(e) => {
                    // Stray debug output from the server
                    tracing::warn!(line = %trimmed, error = %e, "Skipping non-JSON-RPC line");
                    continue;
                }
            };

            match message.kind() {
                MessageKind::Response if message.id.as_ref() == Some(&expected) => {
                    if let Some(error) = message.error {
                        return Err(McpError::Rpc {
                            code: error.code,
                            message: error.message,
                        });
                    }
                    let result = message.result.ok_or_else(|| {
                        McpError::Protocol(format!("Response to '{method}' has no result"))
                    })?;
                    return Ok(serde_json::from_value(result)?);
                }
                MessageKind::Response => {
                    tracing::debug!(id = ?message.id, "Skipping response to another request");
                }
                MessageKind::Request => self.answer_server_request(session, message).await?,
                MessageKind::Notification => {
                    tracing::debug!(method = ?message.method, "Skipping server notification");
                }
                MessageKind::Invalid => {
                    tracing::warn!(line = %trimmed, "Skipping malformed JSON-RPC message");
                }
            }
        }
    }

    async fn answer_server_request(
        &self,
        session: &Session,
        message: JsonRpcMessage,
    ) -> Result<(), McpError> {
        let id = message.id.unwrap_or(Value::Null);
        let method = message.method.unwrap_or_default();

        let response = match method.as_str() {
            "ping" => JsonRpcResponse::success(id, json!({})),
            "sampling/createMessage" => match self.sample(message.params).await {
                Ok(result) => JsonRpcResponse::success(id, serde_json::to_value(result)?),
                Err(error) => JsonRpcResponse::failure(id, error),
            },
            other => {
                tracing::warn!(method = %other, "Unsupported server request");
                JsonRpcResponse::failure(
                    id,
                    JsonRpcError::method_not_found(format!("Unsupported method: {other}")),
                )
            }
        };

        session.send(&response).await
    }

    async fn sample(&self, params: Option<Value>) -> Result<CreateMessageResult, JsonRpcError> {
        let sampler = self
            .sampler
            .as_ref()
            .ok_or_else(|| JsonRpcError::method_not_found("Sampling is not supported"))?;

        let params: CreateMessageParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid sampling params: {e}")))?;

        let result = sampler
            .create_message(sampling_request(params))
            .await
            .map_err(|e| JsonRpcError::internal(format!("Sampling failed: {e}")))?;

        Ok(CreateMessageResult {
            role: "assistant".to_string(),
            model: result.model,
            content: Content::text(result.text),
            stop_reason: Some("endTurn".to_string()),
        })
    }
}

/// Normalize roles and keep only text messages
fn sampling_request(params: CreateMessageParams) -> SamplingRequest {
    let messages = params
        .messages
        .into_iter()
        .filter_map(|m| {
            let role = if m.role == "assistant" {
                Role::Model
            } else {
                Role::User
            };
            m.content.as_text().map(|text| SamplingMessage {
                role,
                text: text.to_string(),
            })
        })
        .collect();

    SamplingRequest {
        messages,
        system_prompt: params.system_prompt,
        max_tokens: params.max_tokens,
        temperature: params.temperature,
        top_p: params.top_p,
    }
}

#[async_trait]
impl ToolServer for McpClient {
    async fn list_tools(&self) -> Result<ToolCatalog, McpError> {
        let mut definitions = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.map_or_else(|| json!({}), |c| json!({ "cursor": c }));
            let page: ListToolsResult = self.request("tools/list", params).await?;
            definitions.extend(page.tools.into_iter().map(|tool| ToolDefinition {
                name: tool.name,
                description: tool.description.unwrap_or_default(),
                input_schema: tool
                    .input_schema
                    .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
            }));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        tracing::debug!(tools = definitions.len(), "Fetched tool catalog");
        Ok(ToolCatalog::new(definitions))
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ToolResult, McpError> {
        let params = serde_json::to_value(CallToolParams {
            name: name.to_string(),
            arguments: arguments.clone(),
        })?;
        let result: CallToolResult = self.request("tools/call", params).await?;

        let texts: Vec<String> = result
            .content
            .iter()
            .filter_map(Content::as_text)
            .map(str::to_string)
            .collect();
        let mut tool_result = ToolResult::from_texts(name, &texts);
        tool_result.is_error = result.is_error;
        Ok(tool_result)
    }

    async fn list_prompts(&self) -> Result<Vec<String>, McpError> {
        let mut names = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.map_or_else(|| json!({}), |c| json!({ "cursor": c }));
            let page: ListPromptsResult = self.request("prompts/list", params).await?;
            names.extend(page.prompts.into_iter().map(|p| p.name));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(names)
    }

    async fn run_prompt(
        &self,
        name: &str,
        arguments: &BTreeMap<String, String>,
    ) -> Result<Option<String>, McpError> {
        let params = serde_json::to_value(GetPromptParams {
            name: name.to_string(),
            arguments: arguments.clone(),
        })?;
        let result: GetPromptResult = self.request("prompts/get", params).await?;

        Ok(result
            .messages
            .first()
            .and_then(|m| m.content.as_text())
            .map(str::to_string))
    }
}
