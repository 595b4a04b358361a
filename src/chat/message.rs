//! Transcript entries.

use crate::client::RetrievedContext;
use crate::format::{self, FormatOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Who a transcript entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Error,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Error => "error",
            Role::System => "system",
        };
        f.write_str(s)
    }
}

/// Extra data carried by assistant replies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retrieved_context: Vec<RetrievedContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>, metadata: Option<MessageMetadata>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            role,
            created_at: Utc::now(),
            metadata,
        }
    }

    pub fn tokens(&self) -> u32 {
        self.metadata.as_ref().and_then(|m| m.tokens).unwrap_or(0)
    }

    /// Markup for display. Links are only rendered in assistant replies.
    pub fn to_html(&self) -> String {
        let options = match self.role {
            Role::Assistant => FormatOptions::assistant(),
            _ => FormatOptions::user(),
        };
        format::format(&self.text, &options)
    }
}
