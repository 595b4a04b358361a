//! Shared test utilities for parley integration tests.

#![allow(dead_code)]

use parley::client::ApiClient;
use parley::config::ApiConfig;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a client pointed at a mock server with default settings.
pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&api_config(&server.uri()))
}

pub fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        ..ApiConfig::default()
    }
}

/// A typical successful chat reply body.
pub fn chat_reply(text: &str, conversation_id: &str) -> Value {
    json!({
        "response": text,
        "conversation_id": conversation_id,
        "retrieved_context": [
            {"id": "cv.md", "text": "Peter writes Rust", "similarity": 0.91}
        ],
        "timestamp": "2026-10-19T10:00:00Z",
        "metadata": {"processing_time": 84.0, "model": "gpt-4o-mini", "tokens": 42}
    })
}

/// Mount a healthy `/health` endpoint.
pub async fn mount_healthy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "service": "rag-chat",
            "version": "1.0.0"
        })))
        .mount(server)
        .await;
}

/// Mount a chat endpoint that always answers with `text`.
pub async fn mount_chat(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(text, "conv_test")))
        .mount(server)
        .await;
}
