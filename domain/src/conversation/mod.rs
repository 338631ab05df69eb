//! Per-thread, per-cluster conversation state.
//!
//! A chat thread can talk to several clusters; each (thread, cluster) pair
//! is its own remote conversation with its own correlation id and budget.

pub mod command;
pub mod entities;
