//! A conversation with the remote service.

use super::locale::{Locale, Notice};
use super::message::{Message, MessageMetadata, Role};
use super::state::{ChatState, ConnectionStatus};
use crate::client::{ApiClient, ApiError, ChatResponse};
use crate::config::ParleyConfig;
use crate::storage::{self, ConversationStore, StorageError};

/// Ties an [`ApiClient`] to a [`ChatState`] and a conversation id.
pub struct ChatSession {
    client: ApiClient,
    /// Separate lane so connection checks never supersede a chat request
    probe: ApiClient,
    state: ChatState,
    store: ConversationStore,
    conversation_id: String,
    user_id: String,
    locale: Locale,
    log_content: bool,
}

impl ChatSession {
    pub fn new(
        client: ApiClient,
        conversation_id: impl Into<String>,
        user_id: impl Into<String>,
        locale: Locale,
    ) -> Self {
        let probe = client.sibling();
        Self {
            client,
            probe,
            state: ChatState::new(),
            store: ConversationStore::disabled(),
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
            locale,
            log_content: false,
        }
    }

    /// Build a session from configuration, resuming the stored conversation.
    ///
    /// A state file that cannot be written does not prevent chatting; the
    /// session then runs with a fresh, unpersisted id.
    pub fn from_config(config: &ParleyConfig) -> Self {
        let store = ConversationStore::from_config(&config.storage);
        let conversation_id = store.load_or_create().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Conversation id not persisted");
            storage::new_conversation_id()
        });

        let mut session = Self::new(
            ApiClient::new(&config.api),
            conversation_id,
            config.chat.user_id.clone(),
            config.chat.locale,
        );
        session.store = store;
        session.log_content = config.logging.log_message_content;
        session
    }

    pub fn with_store(mut self, store: ConversationStore) -> Self {
        self.store = store;
        self
    }

    /// Continue a specific conversation instead of the stored one.
    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    /// Send user input and record the outcome in the transcript.
    ///
    /// Blank input is ignored and yields `Ok(None)`. On failure an error-role
    /// entry with localized text is appended and the error is returned.
    pub async fn send(&mut self, text: &str) -> Result<Option<Message>, ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        self.state.append(Role::User, text, None);
        self.state.set_loading(true);
        self.state.set_error(None);

        if self.log_content {
            tracing::debug!(conversation_id = %self.conversation_id, query = %text, "Sending message");
        } else {
            tracing::debug!(conversation_id = %self.conversation_id, chars = text.chars().count(), "Sending message");
        }

        let result = self
            .client
            .send_message(text, &self.conversation_id, &self.user_id)
            .await
            .and_then(non_empty_reply);

        self.state.set_loading(false);

        match result {
            Ok(reply) => {
                if !reply.conversation_id.is_empty() && reply.conversation_id != self.conversation_id {
                    tracing::debug!(
                        requested = %self.conversation_id,
                        returned = %reply.conversation_id,
                        "Server assigned a different conversation id"
                    );
                }
                let metadata = MessageMetadata {
                    retrieved_context: reply.retrieved_context,
                    processing_time_ms: reply.metadata.as_ref().and_then(|m| m.processing_time),
                    tokens: reply.metadata.as_ref().and_then(|m| m.tokens),
                };
                let message = self
                    .state
                    .append(Role::Assistant, reply.response, Some(metadata))
                    .clone();
                Ok(Some(message))
            }
            Err(e) => {
                let text = self.describe(&e);
                self.state.append(Role::Error, text.clone(), None);
                self.state.set_error(Some(text));
                Err(e)
            }
        }
    }

    /// User-facing text for a failed send in the session's locale.
    ///
    /// Blank input never reaches the client, so a rejected query is one over
    /// the length limit.
    pub fn describe(&self, error: &ApiError) -> String {
        match error {
            ApiError::Validation {
                field: Some("query"),
                ..
            } => self
                .locale
                .text(Notice::MessageTooLong(self.client.max_message_length())),
            other => self.locale.describe(other),
        }
    }

    /// Resend the most recent user message. `Ok(None)` when there is none.
    pub async fn retry(&mut self) -> Result<Option<Message>, ApiError> {
        let Some(last) = self.state.last_user_message().map(|m| m.text.clone()) else {
            return Ok(None);
        };
        self.send(&last).await
    }

    /// Probe the service and record the result as the connection status.
    pub async fn check_connection(&mut self) -> ConnectionStatus {
        self.state.set_connection_status(ConnectionStatus::Connecting);
        let status = if self.probe.health_check().await {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Error
        };
        self.state.set_connection_status(status);
        status
    }

    /// Abandon an interrupted turn: drop the pending request and clear the loading flag.
    ///
    /// The user message stays in the transcript so `/retry` can resend it.
    pub fn interrupt(&mut self) {
        self.client.cancel();
        self.state.set_loading(false);
    }

    /// Start over: clear the transcript and switch to a new conversation id.
    pub fn new_conversation(&mut self) -> Result<&str, StorageError> {
        self.client.cancel();
        self.state.clear();
        self.conversation_id = self.store.rotate()?;
        Ok(&self.conversation_id)
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }
}

fn non_empty_reply(reply: ChatResponse) -> Result<ChatResponse, ApiError> {
    if reply.response.trim().is_empty() {
        return Err(ApiError::InvalidResponse(
            "Received an empty response from the server".to_string(),
        ));
    }
    Ok(reply)
}
