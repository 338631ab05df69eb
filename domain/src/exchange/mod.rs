//! One streamed exchange with a remote cluster agent.
//!
//! The transport decodes the wire stream into [`stream::StreamEvent`] values;
//! [`fold::StreamFold`] reduces them into the final answer.

pub mod fold;
pub mod stream;
