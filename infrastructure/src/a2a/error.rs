//! Error types for the A2A adapter

use relay_application::ExchangeError;
use relay_domain::{FoldError, truncate};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for A2A operations
pub type Result<T> = std::result::Result<T, A2aError>;

/// Transport-level failures while talking to a cluster agent
#[derive(Error, Debug)]
pub enum A2aError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Agent returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stream read error: {0}")]
    Stream(String),

    #[error("Request timeout after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error(transparent)]
    Fold(#[from] FoldError),

    #[error("Exchange cancelled")]
    Cancelled,
}

impl From<A2aError> for ExchangeError {
    fn from(err: A2aError) -> Self {
        match err {
            A2aError::Http(e) if e.is_timeout() => {
                ExchangeError::Unreachable(format!("connect timeout: {e}"))
            }
            A2aError::Http(e) if e.is_decode() || e.is_body() => {
                ExchangeError::Malformed(e.to_string())
            }
            A2aError::Http(e) => match e.status() {
                Some(status) => ExchangeError::Rejected {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => ExchangeError::Unreachable(e.to_string()),
            },
            A2aError::Status { status, body } => ExchangeError::Rejected {
                status,
                message: truncate(&body, 200),
            },
            A2aError::Serialization(e) => ExchangeError::Malformed(e.to_string()),
            A2aError::Stream(message) => ExchangeError::Unreachable(message),
            A2aError::Timeout(limit) => ExchangeError::TimedOut(limit),
            A2aError::Fold(e) => e.into(),
            A2aError::Cancelled => ExchangeError::Cancelled,
        }
    }
}
