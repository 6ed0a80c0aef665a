//! Conversation orchestrator
//!
//! Turns console input into model turns, running requested tools through the
//! tool server and committing history only for turns that complete.

mod command;
mod session;

#[cfg(test)]
mod proptests;

#[cfg(test)]
pub mod testing;

pub use command::{merge_template, Input, COMMAND_MARKER};
pub use session::{AbandonReason, ChatSession, TurnOutcome, INPUT_PROMPT, NO_RESPONSE_NOTICE};
