//! Meeting tool server
//!
//! Serves the meeting tools and prompt templates over newline-delimited
//! JSON-RPC on any reader/writer pair (stdin/stdout in the binary).

pub mod prompts;
pub mod store;
pub mod tools;

use crate::mcp::protocol::{
    CallToolParams, CallToolResult, Content, GetPromptParams, Implementation, InitializeResult,
    JsonRpcError, JsonRpcMessage, JsonRpcResponse, MessageKind, PARSE_ERROR, PROTOCOL_VERSION,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use store::MeetingStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tools::ToolRegistry;

pub const SERVER_NAME: &str = "MeetingAssistantMCP";

const INSTRUCTIONS: &str = "You are an efficient meeting assistant. Your job is to help users \
schedule meetings, add attendees, record action items, and generate summaries. Always refer to \
meetings by their unique topic.";

pub struct MeetingServer {
    store: MeetingStore,
    tools: ToolRegistry,
}

impl MeetingServer {
    pub fn new(store: MeetingStore) -> Self {
        Self {
            store,
            tools: ToolRegistry::meetings(),
        }
    }

    pub fn store(&self) -> &MeetingStore {
        &self.store
    }

    /// Serve requests until the reader reaches EOF
    pub async fn run<R, W>(&mut self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let Some(response) = self.handle_line(trimmed) else {
                continue;
            };
            let serialized = serde_json::to_string(&response)?;
            writer.write_all(serialized.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        tracing::info!("Client closed the connection");
        Ok(())
    }

    /// Handle one raw line; `None` when nothing should be written back
    pub fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let message: JsonRpcMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse request");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(PARSE_ERROR, format!("Parse error: {e}")),
                ));
            }
        };

        match message.kind() {
            MessageKind::Request => {
                let id = message.id.clone().unwrap_or(Value::Null);
                let method = message.method.clone().unwrap_or_default();
                Some(match self.handle_request(&method, message.params) {
                    Ok(result) => JsonRpcResponse::success(id, result),
                    Err(error) => {
                        tracing::warn!(method = %method, code = error.code, "{}", error.message);
                        JsonRpcResponse::failure(id, error)
                    }
                })
            }
            MessageKind::Notification => {
                tracing::debug!(method = ?message.method, "Received notification");
                None
            }
            MessageKind::Response => {
                tracing::debug!(id = ?message.id, "Ignoring unsolicited response");
                None
            }
            MessageKind::Invalid => {
                tracing::warn!("Ignoring message with neither id nor method");
                None
            }
        }
    }

    pub fn handle_request(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => to_value(InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: json!({ "tools": {}, "prompts": {} }),
                server_info: Some(Implementation {
                    name: SERVER_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                }),
                instructions: Some(INSTRUCTIONS.to_string()),
            }),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tools.definitions() })),
            "tools/call" => {
                let params: CallToolParams = parse_params(params)?;
                let output = self
                    .tools
                    .execute(&params.name, Value::Object(params.arguments), &mut self.store)
                    .ok_or_else(|| {
                        JsonRpcError::method_not_found(format!("Unknown tool: {}", params.name))
                    })?;
                to_value(CallToolResult {
                    content: vec![Content::text(output.output)],
                    is_error: !output.success,
                })
            }
            "prompts/list" => {
                let prompts: Vec<_> = prompts::PROMPTS.iter().map(prompts::Prompt::info).collect();
                Ok(json!({ "prompts": prompts }))
            }
            "prompts/get" => {
                let params: GetPromptParams = parse_params(params)?;
                let prompt = prompts::find(&params.name).ok_or_else(|| {
                    JsonRpcError::invalid_params(format!("Unknown prompt: {}", params.name))
                })?;
                to_value(prompt.render())
            }
            other => Err(JsonRpcError::method_not_found(format!(
                "Unsupported method: {other}"
            ))),
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))
}

fn to_value(value: impl serde::Serialize) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal(e.to_string()))
}
