//! JSON-RPC protocol types for the A2A streaming API.
//!
//! # Protocol Overview
//!
//! - **Request**: one `message/stream` call carrying the user's message and,
//!   for follow-up turns, the remote `contextId`
//! - **Response**: a `text/event-stream` whose events each carry a JSON-RPC
//!   response; `result` holds a task status update, a message or an artifact
//!   update, and `error` ends the exchange

use relay_domain::{StreamEvent, TaskState};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Method name of the streaming message call.
pub const STREAM_METHOD: &str = "message/stream";

/// Global request ID counter for JSON-RPC requests.
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Generates a unique request ID.
fn next_id() -> u64 {
    REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<P> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: P,
}

impl<P: Serialize> JsonRpcRequest<P> {
    /// Creates a new JSON-RPC request with an auto-generated ID.
    pub fn new(method: &'static str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id: next_id(),
            method,
            params,
        }
    }
}

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
    #[serde(other)]
    Unknown,
}

/// One part of a message. Only text parts are produced or read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

/// Outgoing user message
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

/// Params of `message/stream`
#[derive(Debug, Clone, Serialize)]
pub struct MessageSendParams {
    pub message: Message,
}

impl MessageSendParams {
    /// A user text message with a fresh message id.
    pub fn user_text(text: impl Into<String>, context_id: Option<String>) -> Self {
        Self {
            message: Message {
                role: Role::User,
                parts: vec![Part::text(text)],
                message_id: uuid::Uuid::new_v4().to_string(),
                context_id,
            },
        }
    }
}

/// JSON-RPC response carried by one stream event
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub result: Option<StreamResult>,
    pub error: Option<RpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Message nested in a task status or sent as a result on its own
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
    pub context_id: Option<String>,
}

impl IncomingMessage {
    fn agent_text(&self) -> Option<String> {
        (self.role == Some(Role::Agent))
            .then(|| joined_text(&self.parts))
            .flatten()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskStatus {
    pub state: Option<String>,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// `result` of a stream event: a status update, an artifact update, a task
/// or a plain message. Fields absent for a given kind are left empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResult {
    pub kind: Option<String>,
    pub context_id: Option<String>,
    pub status: Option<TaskStatus>,
    #[serde(default, rename = "final")]
    pub is_final: bool,
    pub artifact: Option<Artifact>,
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl StreamResult {
    fn agent_text(&self) -> Option<String> {
        if let Some(text) = self
            .status
            .as_ref()
            .and_then(|s| s.message.as_ref())
            .and_then(IncomingMessage::agent_text)
        {
            return Some(text);
        }
        match self.kind.as_deref() {
            Some("artifact-update") => self
                .artifact
                .as_ref()
                .and_then(|a| joined_text(&a.parts)),
            Some("message") if self.role == Some(Role::Agent) => joined_text(&self.parts),
            _ => None,
        }
    }

    fn context_id(&self) -> Option<String> {
        self.context_id.clone().or_else(|| {
            self.status
                .as_ref()
                .and_then(|s| s.message.as_ref())
                .and_then(|m| m.context_id.clone())
        })
    }
}

impl JsonRpcResponse {
    /// Convert into a domain event.
    ///
    /// Returns `None` when the response carries neither a result nor an
    /// error; callers count that as a malformed event.
    pub fn into_stream_event(self) -> Option<StreamEvent> {
        if let Some(error) = self.error {
            return Some(StreamEvent::error(format!(
                "{} (code {})",
                error.message, error.code
            )));
        }

        let result = self.result?;
        let state: Option<TaskState> = result
            .status
            .as_ref()
            .and_then(|s| s.state.as_deref())
            .and_then(|s| s.parse().ok());

        let mut event = match result.agent_text() {
            Some(text) => StreamEvent::agent_message(state.clone(), text),
            None => match state.clone() {
                Some(state) => StreamEvent::status(state),
                None => StreamEvent {
                    state: None,
                    ..StreamEvent::status(TaskState::Submitted)
                },
            },
        };
        if let Some(context_id) = result.context_id() {
            event = event.with_context_id(context_id);
        }
        Some(event.with_final(result.is_final))
    }
}

/// Text parts joined by newlines; `None` if there is no non-empty text.
fn joined_text(parts: &[Part]) -> Option<String> {
    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .filter(|t| !t.is_empty())
        .collect();
    (!texts.is_empty()).then(|| texts.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::EventKind;

    fn event(json: &str) -> StreamEvent {
        serde_json::from_str::<JsonRpcResponse>(json)
            .unwrap()
            .into_stream_event()
            .unwrap()
    }

    #[test]
    fn test_request_envelope() {
        let request = JsonRpcRequest::new(
            STREAM_METHOD,
            MessageSendParams::user_text("list pods", Some("ctx-1".to_string())),
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["method"], "message/stream");
        let message = &json["params"]["message"];
        assert_eq!(message["role"], "user");
        assert_eq!(message["parts"][0]["kind"], "text");
        assert_eq!(message["parts"][0]["text"], "list pods");
        assert_eq!(message["contextId"], "ctx-1");
        assert_eq!(message["messageId"].as_str().unwrap().len(), 36);
    }

    #[test]
    fn test_new_conversation_omits_context_id() {
        let params = MessageSendParams::user_text("hi", None);
        let json = serde_json::to_value(&params).unwrap();
        assert!(json["message"].get("contextId").is_none());
    }

    #[test]
    fn test_fresh_message_ids() {
        let a = MessageSendParams::user_text("q", None);
        let b = MessageSendParams::user_text("q", None);
        assert_ne!(a.message.message_id, b.message.message_id);
    }

    #[test]
    fn test_status_update_with_agent_message() {
        let ev = event(
            r#"{"jsonrpc":"2.0","id":1,"result":{"kind":"status-update","contextId":"ctx-9",
                "status":{"state":"completed","message":{"role":"agent",
                "parts":[{"kind":"text","text":"42 pods"}]}},"final":true}}"#,
        );
        assert_eq!(ev.kind, EventKind::Message);
        assert_eq!(ev.payload_text.as_deref(), Some("42 pods"));
        assert_eq!(ev.context_id.as_deref(), Some("ctx-9"));
        assert_eq!(ev.state, Some(TaskState::Completed));
        assert!(ev.is_final);
    }

    #[test]
    fn test_user_echo_has_no_text() {
        let ev = event(
            r#"{"result":{"status":{"state":"working","message":{"role":"user",
                "parts":[{"kind":"text","text":"list pods"}]}}}}"#,
        );
        assert_eq!(ev.kind, EventKind::Status);
        assert_eq!(ev.payload_text, None);
        assert_eq!(ev.state, Some(TaskState::Working));
    }

    #[test]
    fn test_multiple_parts_joined() {
        let ev = event(
            r#"{"result":{"status":{"state":"working","message":{"role":"agent",
                "parts":[{"kind":"text","text":"line 1"},{"kind":"data"},{"kind":"text","text":"line 2"}]}}}}"#,
        );
        assert_eq!(ev.payload_text.as_deref(), Some("line 1\nline 2"));
    }

    #[test]
    fn test_artifact_update_text() {
        let ev = event(
            r#"{"result":{"kind":"artifact-update","contextId":"c",
                "artifact":{"parts":[{"kind":"text","text":"report"}]}}}"#,
        );
        assert_eq!(ev.payload_text.as_deref(), Some("report"));
        assert_eq!(ev.state, None);
    }

    #[test]
    fn test_rpc_error() {
        let ev = event(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid params"}}"#);
        assert_eq!(ev.kind, EventKind::Error);
        assert_eq!(ev.error_message.as_deref(), Some("Invalid params (code -32602)"));
        assert!(ev.is_terminal());
    }

    #[test]
    fn test_empty_response_is_none() {
        let response: JsonRpcResponse = serde_json::from_str(r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        assert!(response.into_stream_event().is_none());
    }

    #[test]
    fn test_unknown_role_tolerated() {
        let ev = event(
            r#"{"result":{"status":{"state":"working","message":{"role":"system","parts":[]}}}}"#,
        );
        assert_eq!(ev.payload_text, None);
    }
}
