//! Interactive chat module
//!
//! Provides a line-editor based chat front end: every line is sent to the
//! orchestrator under one thread id, and operator commands manage the
//! thread's conversations.

mod input;
mod repl;

pub use input::ReplInput;
pub use repl::ChatRepl;
