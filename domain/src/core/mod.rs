//! Core domain concepts shared across all subdomains.
//!
//! - [`tokens`]: token estimation used for conversation budgets
//! - [`string`]: UTF-8 safe truncation helpers for logs and displays
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod string;
pub mod tokens;
