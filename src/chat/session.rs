//! Turn orchestration over a committed history
//!
//! Each turn drafts on a copy of the committed history. The copy replaces the
//! committed history only when the turn reaches its commit point; every
//! earlier failure drops it.

use super::command::{merge_template, Input, COMMAND_MARKER};
use crate::llm::{LlmError, LlmResponse, Message, ModelAdapter};
use crate::mcp::{McpError, ToolServer};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub const INPUT_PROMPT: &str = "> ";

pub const NO_RESPONSE_NOTICE: &str = "The model did not provide a response. This might be due \
to content safety filters. Please try rephrasing your request.";

/// Why a turn was dropped without touching committed history
#[derive(Debug, Error)]
pub enum AbandonReason {
    #[error("Nothing to send.")]
    EmptyInput,
    #[error("Missing command name after '/'.")]
    MissingCommand,
    #[error("Error running prompt '{name}': {source}")]
    PromptFailed { name: String, source: McpError },
    #[error("Prompt '{0}' returned no content.")]
    EmptyPrompt(String),
    #[error("Could not fetch tools: {0}")]
    ToolCatalog(McpError),
    #[error("The model is temporarily unavailable. Please try again in a moment.")]
    ModelUnavailable,
    #[error("Model request failed: {0}")]
    Model(LlmError),
}

/// Result of one turn
#[derive(Debug)]
pub enum TurnOutcome {
    /// Working history was committed; `text` may be blank
    Committed { text: String },
    Abandoned(AbandonReason),
    Exit,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Dispatching,
    AwaitingModel,
    ExecutingTools,
    AwaitingFinalModel,
    Committing,
}

/// One interactive conversation
pub struct ChatSession<'a> {
    model: &'a dyn ModelAdapter,
    tools: &'a dyn ToolServer,
    history: Vec<Message>,
}

impl<'a> ChatSession<'a> {
    pub fn new(model: &'a dyn ModelAdapter, tools: &'a dyn ToolServer) -> Self {
        Self {
            model,
            tools,
            history: Vec::new(),
        }
    }

    /// Committed history
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Print the available slash commands. Failure is reported, not fatal.
    pub async fn announce_commands<W>(&self, out: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match self.tools.list_prompts().await {
            Ok(names) if names.is_empty() => Ok(()),
            Ok(names) => {
                let commands = names
                    .iter()
                    .map(|n| format!("{COMMAND_MARKER}{n}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write_line(out, &format!("Tip: Use slash commands (e.g., {commands})")).await
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not fetch prompts");
                write_line(out, &format!("Could not fetch prompts: {e}")).await
            }
        }
    }

    /// Read lines until `exit` or end of input
    pub async fn run<R, W>(&mut self, input: R, mut out: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        loop {
            out.write_all(INPUT_PROMPT.as_bytes()).await?;
            out.flush().await?;

            let Some(line) = lines.next_line().await? else {
                tracing::debug!("Input closed");
                break;
            };
            if Input::parse(&line) == Input::Empty {
                continue;
            }

            match self.run_turn(&line).await {
                TurnOutcome::Exit => break,
                TurnOutcome::Committed { text } if text.trim().is_empty() => {
                    write_line(&mut out, NO_RESPONSE_NOTICE).await?;
                }
                TurnOutcome::Committed { text } => write_line(&mut out, &text).await?,
                TurnOutcome::Abandoned(reason) => {
                    tracing::warn!(reason = %reason, "Turn abandoned");
                    write_line(&mut out, &reason.to_string()).await?;
                }
            }
        }
        Ok(())
    }

    /// Drive one line of input through to commit or abandonment
    pub async fn run_turn(&mut self, line: &str) -> TurnOutcome {
        tracing::debug!(phase = ?Phase::Dispatching, "Turn started");
        let message = match Input::parse(line) {
            Input::Exit => return TurnOutcome::Exit,
            Input::Empty => return TurnOutcome::Abandoned(AbandonReason::EmptyInput),
            Input::Command { name, remainder } => {
                match self.resolve_command(name, &remainder).await {
                    Ok(text) => text,
                    Err(reason) => return TurnOutcome::Abandoned(reason),
                }
            }
            Input::Message(text) => text.to_string(),
        };

        match self.converse(message).await {
            Ok(text) => TurnOutcome::Committed { text },
            Err(reason) => TurnOutcome::Abandoned(reason),
        }
    }

    async fn resolve_command(&self, name: &str, remainder: &str) -> Result<String, AbandonReason> {
        if name.is_empty() {
            return Err(AbandonReason::MissingCommand);
        }
        tracing::info!(prompt = %name, "Running prompt");

        let template = self
            .tools
            .run_prompt(name, &BTreeMap::new())
            .await
            .map_err(|source| AbandonReason::PromptFailed {
                name: name.to_string(),
                source,
            })?
            .ok_or_else(|| AbandonReason::EmptyPrompt(name.to_string()))?;

        Ok(merge_template(&template, remainder))
    }

    async fn converse(&mut self, user_text: String) -> Result<String, AbandonReason> {
        let mut working = self.history.clone();
        self.model
            .append_to_history(&mut working, Message::user_text(user_text));

        tracing::debug!(phase = ?Phase::AwaitingModel, messages = working.len());
        let catalog = self
            .tools
            .list_tools()
            .await
            .map_err(AbandonReason::ToolCatalog)?;
        let response = self.chat(&working, Some(&catalog)).await?;
        self.append_valid(&mut working, &response);

        let final_text = if response.has_tool_calls() {
            tracing::debug!(
                phase = ?Phase::ExecutingTools,
                calls = response.tool_invocations().len()
            );
            let results = self.model.execute_tool_calls(self.tools, &response).await;
            self.model
                .append_to_history(&mut working, Message::tool_results(results));

            tracing::debug!(phase = ?Phase::AwaitingFinalModel, messages = working.len());
            let final_response = self.chat(&working, None).await?;
            self.append_valid(&mut working, &final_response);
            self.model.extract_text(Some(&final_response))
        } else {
            self.model.extract_text(Some(&response))
        };

        tracing::debug!(phase = ?Phase::Committing, messages = working.len());
        self.history = working;
        Ok(final_text)
    }

    async fn chat(
        &self,
        working: &[Message],
        catalog: Option<&crate::llm::ToolCatalog>,
    ) -> Result<LlmResponse, AbandonReason> {
        self.model
            .chat(working, catalog)
            .await
            .map_err(AbandonReason::Model)?
            .ok_or(AbandonReason::ModelUnavailable)
    }

    /// Append the first candidate's content unless it is empty
    fn append_valid(&self, working: &mut Vec<Message>, response: &LlmResponse) {
        match response.valid_content() {
            Some(content) => self.model.append_to_history(working, content.clone()),
            None => tracing::debug!("Discarding empty model response"),
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
