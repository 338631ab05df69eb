//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod manage_context;
pub mod orchestrate;
