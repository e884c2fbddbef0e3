//! Event types flowing out of an assistant invocation.
//!
//! `StreamEvent` is the decoded form of one protocol line; `ChatUpdate` is the
//! narrower shape handed to UI callers. Auth and service-wide notices live here
//! too so every crate agrees on a single vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One decoded event from the assistant's output stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    /// The assistant invoked an auxiliary tool
    ToolUse {
        name: String,
        input: Option<serde_json::Value>,
    },
    /// An auxiliary tool finished
    ToolResult { success: bool },
    /// A fragment of response text
    Message { role: String, content: String },
    /// Terminal marker; carries nothing
    Result,
    /// Any other object type, passed through for optional display
    Other,
}

impl StreamEvent {
    /// Assistant-authored text carried by this event, if any.
    pub fn assistant_text(&self) -> Option<&str> {
        match self {
            StreamEvent::Message { role, content } if role == "assistant" => Some(content),
            _ => None,
        }
    }
}

/// Kind tag of a [`ChatUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatUpdateKind {
    ToolUse,
    ToolResult,
    Message,
    Result,
    Other,
}

impl ChatUpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatUpdateKind::ToolUse => "tool_use",
            ChatUpdateKind::ToolResult => "tool_result",
            ChatUpdateKind::Message => "message",
            ChatUpdateKind::Result => "result",
            ChatUpdateKind::Other => "other",
        }
    }
}

/// Streamed status update re-emitted to the host during a chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatUpdate {
    pub kind: ChatUpdateKind,
    pub content: String,
    pub tool_name: Option<String>,
    pub tool_input: Option<serde_json::Value>,
}

impl From<&StreamEvent> for ChatUpdate {
    fn from(event: &StreamEvent) -> Self {
        match event {
            StreamEvent::ToolUse { name, input } => ChatUpdate {
                kind: ChatUpdateKind::ToolUse,
                content: String::new(),
                tool_name: Some(name.clone()),
                tool_input: input.clone(),
            },
            StreamEvent::ToolResult { success } => ChatUpdate {
                kind: ChatUpdateKind::ToolResult,
                content: if *success { "success" } else { "error" }.to_string(),
                tool_name: None,
                tool_input: None,
            },
            StreamEvent::Message { content, .. } => ChatUpdate {
                kind: ChatUpdateKind::Message,
                content: content.clone(),
                tool_name: None,
                tool_input: None,
            },
            StreamEvent::Result => ChatUpdate {
                kind: ChatUpdateKind::Result,
                content: String::new(),
                tool_name: None,
                tool_input: None,
            },
            StreamEvent::Other => ChatUpdate {
                kind: ChatUpdateKind::Other,
                content: String::new(),
                tool_name: None,
                tool_input: None,
            },
        }
    }
}

/// Sign-in state of the assistant. Recomputed on every check, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthState {
    NotInstalled,
    Unauthenticated,
    Authenticating,
    Authenticated,
    Failed(String),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }
}

/// Progress of an interactive login, emitted as lines arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    StateChanged(AuthState),
    /// Raw progress line from either stream of the login process
    Output(String),
    /// First sign-in URL seen in the login output
    UrlDiscovered(String),
}

/// Service-wide notifications broadcast to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceNotice {
    /// A call failed because the assistant needs a fresh sign-in
    AuthenticationRequired,
    AuthStateChanged(AuthState),
    AccountChanged {
        active: String,
        changed_at: DateTime<Utc>,
    },
}
