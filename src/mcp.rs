//! Tool server proxy
//!
//! Talks MCP (newline-delimited JSON-RPC 2.0) to a subprocess over its
//! stdin/stdout. The orchestrator only sees the [`ToolServer`] trait.

mod client;
pub mod protocol;

pub use client::{ConnectionStatus, McpClient};

use crate::llm::{LlmError, SamplingRequest, SamplingResult, ToolCatalog, ToolResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Tool server failures. Application-level errors (unknown meeting, ...)
/// never show up here; they arrive as ordinary tool results.
#[derive(Debug, Error)]
pub enum McpError {
    /// Operation outside the `Connected` state, or handshake failure
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Tool server I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Tool server error [{code}]: {message}")]
    Rpc { code: i64, message: String },
    #[error("Invalid JSON from tool server: {0}")]
    Json(#[from] serde_json::Error),
}

/// Operations the orchestrator needs from a tool server
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// Current tool definitions; no side effects
    async fn list_tools(&self) -> Result<ToolCatalog, McpError>;

    /// Invoke a named tool
    async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ToolResult, McpError>;

    /// Names of the available prompt templates
    async fn list_prompts(&self) -> Result<Vec<String>, McpError>;

    /// Resolve a template to text; `None` when the server returned no messages
    async fn run_prompt(
        &self,
        name: &str,
        arguments: &BTreeMap<String, String>,
    ) -> Result<Option<String>, McpError>;
}

/// Handler for `sampling/createMessage` requests initiated by the server
#[async_trait]
pub trait SamplingHandler: Send + Sync {
    async fn create_message(&self, request: SamplingRequest) -> Result<SamplingResult, LlmError>;
}
