//! Meeting Assistant
//!
//! Interactive CLI that lets a Gemini model manage meeting records through an
//! MCP tool server, with turn-level commit semantics for the conversation.

// Library surface exists for the two binaries and integration tests
#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod chat;
pub mod config;
pub mod llm;
pub mod mcp;
pub mod server;

use thiserror::Error;

/// Fatal errors surfaced from `main`
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("Model setup failed: {0}")]
    Llm(#[from] llm::LlmError),
    #[error("Failed to start tool server: {0}")]
    Mcp(#[from] mcp::McpError),
    #[error("Console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
