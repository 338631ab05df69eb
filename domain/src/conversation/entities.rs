//! Conversation entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite key of a conversation: one chat thread talking to one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextKey {
    pub thread_id: String,
    pub cluster: String,
}

impl ContextKey {
    pub fn new(thread_id: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            cluster: cluster.into(),
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.thread_id, self.cluster)
    }
}

/// How an exchange changed the stored correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextIdChange {
    /// No id was returned, or the same id came back.
    Unchanged,
    /// First id for this conversation.
    Assigned(String),
    /// The agent answered under a different id than the one sent.
    Rotated { previous: String, current: String },
}

/// State of one remote conversation (Entity)
///
/// Invariants:
/// - `token_estimate` never decreases between resets
/// - `message_count` grows by exactly one per completed exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    key: ContextKey,
    protocol_context_id: Option<String>,
    message_count: u64,
    token_estimate: u64,
    last_activity: DateTime<Utc>,
}

impl ConversationContext {
    /// A fresh conversation with zeroed counters and no correlation id.
    pub fn new(key: ContextKey) -> Self {
        Self {
            key,
            protocol_context_id: None,
            message_count: 0,
            token_estimate: 0,
            last_activity: Utc::now(),
        }
    }

    pub fn key(&self) -> &ContextKey {
        &self.key
    }

    pub fn protocol_context_id(&self) -> Option<&str> {
        self.protocol_context_id.as_deref()
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn token_estimate(&self) -> u64 {
        self.token_estimate
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Apply one completed exchange.
    ///
    /// The first id returned by the agent is adopted. A later, different id
    /// means the agent rotated the conversation and the newer value wins.
    pub fn apply_exchange(&mut self, returned_id: Option<&str>, tokens: u64) -> ContextIdChange {
        let change = match (self.protocol_context_id.as_deref(), returned_id) {
            (_, None) => ContextIdChange::Unchanged,
            (Some(current), Some(returned)) if current == returned => ContextIdChange::Unchanged,
            (None, Some(returned)) => ContextIdChange::Assigned(returned.to_string()),
            (Some(current), Some(returned)) => ContextIdChange::Rotated {
                previous: current.to_string(),
                current: returned.to_string(),
            },
        };

        match &change {
            ContextIdChange::Assigned(id) | ContextIdChange::Rotated { current: id, .. } => {
                self.protocol_context_id = Some(id.clone());
            }
            ContextIdChange::Unchanged => {}
        }

        self.message_count += 1;
        self.token_estimate = self.token_estimate.saturating_add(tokens);
        self.touch();
        change
    }

    /// Mark the conversation as used now (without counting an exchange).
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Whether the estimated conversation size has reached `limit` tokens.
    pub fn is_over_budget(&self, limit: u64) -> bool {
        self.token_estimate >= limit
    }

    /// Read-only view for status reporting.
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            thread_id: self.key.thread_id.clone(),
            cluster: self.key.cluster.clone(),
            protocol_context_id: self.protocol_context_id.clone(),
            message_count: self.message_count,
            token_estimate: self.token_estimate,
            last_activity: self.last_activity,
        }
    }
}

/// Point-in-time copy of a conversation, safe to hand to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub thread_id: String,
    pub cluster: String,
    pub protocol_context_id: Option<String>,
    pub message_count: u64,
    pub token_estimate: u64,
    pub last_activity: DateTime<Utc>,
}

impl ContextSnapshot {
    /// Share of `limit` already used, in whole percent (capped at 100).
    pub fn budget_used_pct(&self, limit: u64) -> u8 {
        if limit == 0 {
            return 100;
        }
        let pct = self.token_estimate.saturating_mul(100) / limit;
        pct.min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ConversationContext {
        ConversationContext::new(ContextKey::new("thread-123", "dev"))
    }

    #[test]
    fn test_new_context_is_empty() {
        let ctx = context();
        assert_eq!(ctx.protocol_context_id(), None);
        assert_eq!(ctx.message_count(), 0);
        assert_eq!(ctx.token_estimate(), 0);
    }

    #[test]
    fn test_first_id_is_assigned() {
        let mut ctx = context();
        let change = ctx.apply_exchange(Some("ctx-456"), 10);
        assert_eq!(change, ContextIdChange::Assigned("ctx-456".to_string()));
        assert_eq!(ctx.protocol_context_id(), Some("ctx-456"));
        assert_eq!(ctx.message_count(), 1);
        assert_eq!(ctx.token_estimate(), 10);
    }

    #[test]
    fn test_same_id_is_unchanged() {
        let mut ctx = context();
        ctx.apply_exchange(Some("ctx-456"), 10);
        let change = ctx.apply_exchange(Some("ctx-456"), 5);
        assert_eq!(change, ContextIdChange::Unchanged);
        assert_eq!(ctx.message_count(), 2);
        assert_eq!(ctx.token_estimate(), 15);
    }

    #[test]
    fn test_server_rotation_adopts_newer_id() {
        let mut ctx = context();
        ctx.apply_exchange(Some("ctx-old"), 1);
        let change = ctx.apply_exchange(Some("ctx-new"), 1);
        assert_eq!(
            change,
            ContextIdChange::Rotated {
                previous: "ctx-old".to_string(),
                current: "ctx-new".to_string(),
            }
        );
        assert_eq!(ctx.protocol_context_id(), Some("ctx-new"));
    }

    #[test]
    fn test_missing_id_keeps_existing() {
        let mut ctx = context();
        ctx.apply_exchange(Some("ctx-456"), 1);
        ctx.apply_exchange(None, 1);
        assert_eq!(ctx.protocol_context_id(), Some("ctx-456"));
    }

    #[test]
    fn test_budget_check() {
        let mut ctx = context();
        assert!(!ctx.is_over_budget(100));
        ctx.apply_exchange(None, 99);
        assert!(!ctx.is_over_budget(100));
        ctx.apply_exchange(None, 1);
        assert!(ctx.is_over_budget(100));
    }

    #[test]
    fn test_budget_used_pct() {
        let mut ctx = context();
        ctx.apply_exchange(None, 250);
        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.budget_used_pct(1000), 25);
        assert_eq!(snapshot.budget_used_pct(100), 100);
        assert_eq!(snapshot.budget_used_pct(0), 100);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(ContextKey::new("t1", "prod").to_string(), "t1/prod");
    }
}
