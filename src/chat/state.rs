//! Explicitly owned chat state.
//!
//! Holders pass `&mut ChatState` to whatever updates it; there is no global store.

use super::message::{Message, MessageMetadata, Role};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    #[default]
    Disconnected,
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default, Clone)]
pub struct ChatState {
    messages: Vec<Message>,
    is_loading: bool,
    connection_status: ConnectionStatus,
    error: Option<String>,
    message_count: usize,
    total_tokens: u64,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and update the running counters.
    pub fn append(
        &mut self,
        role: Role,
        text: impl Into<String>,
        metadata: Option<MessageMetadata>,
    ) -> &Message {
        let message = Message::new(role, text, metadata);
        self.message_count += 1;
        self.total_tokens += u64::from(message.tokens());
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn set_connection_status(&mut self, status: ConnectionStatus) {
        self.connection_status = status;
    }

    /// Drop the transcript and reset counters and error. Connection status is kept.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.message_count = 0;
        self.total_tokens = 0;
        self.error = None;
    }

    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection_status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }
}
