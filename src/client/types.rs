//! Wire types for the remote chat API.
//!
//! Response types default every field so that a degraded (non-JSON) success
//! body, which the client treats as `{}`, still deserializes.

use crate::format::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `GET /health` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthResponse {
    pub status: Option<String>,
    pub timestamp: Option<String>,
    pub service: Option<String>,
    pub version: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status.as_deref() == Some("healthy")
    }
}

/// `POST /chat/` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub conversation_id: String,
    pub user_id: String,
}

/// A document fragment the server retrieved to ground its answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievedContext {
    pub id: String,
    pub text: String,
    pub similarity: f64,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// Optional generation metadata attached to a chat reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseMetadata {
    /// Server-side processing time in milliseconds.
    pub processing_time: Option<f64>,
    pub model: Option<String>,
    pub tokens: Option<u32>,
}

/// `POST /chat/` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    pub retrieved_context: Vec<RetrievedContext>,
    /// Offset-less server times are read as UTC; unreadable values become `None`.
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    pub metadata: Option<ResponseMetadata>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => parse_timestamp(&s),
        Some(Value::Number(n)) => n.as_i64().and_then(|ms| parse_timestamp(&ms.to_string())),
        _ => None,
    })
}

/// `GET /admin/cache/stats` response.
///
/// Older deployments answer `{size, totalSize}`; newer ones wrap the
/// statistics under `cache_stats`. Both shapes are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheStats {
    pub size: Option<u64>,
    #[serde(rename = "totalSize")]
    pub total_size: Option<u64>,
    pub cache_stats: Option<Map<String, Value>>,
    pub status: Option<String>,
    pub error: Option<String>,
}

impl CacheStats {
    /// Number of cached entries, from whichever shape the server used.
    pub fn entries(&self) -> Option<u64> {
        self.size.or_else(|| {
            self.cache_stats
                .as_ref()
                .and_then(|s| s.get("size").or_else(|| s.get("total_entries")))
                .and_then(Value::as_u64)
        })
    }
}

/// Acknowledgement returned by `POST /admin/cache/clear`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheAck {
    pub message: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
}

/// `POST /admin/cache/cleanup` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupResult {
    #[serde(alias = "removed_count")]
    pub removed: u64,
    pub message: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
}

/// Vector store cache metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorCacheInfo {
    pub cached_documents: Option<u64>,
    pub cache_age_seconds: Option<f64>,
    pub cache_ttl_seconds: Option<f64>,
    pub cache_fresh: Option<bool>,
    pub last_refresh: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /admin/vector-cache/info` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorCacheInfoResponse {
    pub vector_cache_info: VectorCacheInfo,
    pub status: Option<String>,
    pub error: Option<String>,
}

/// Source material for `POST /api/load-documents`.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSource {
    /// Raw text content.
    Text(String),
    /// A PDF file, sent as a multipart file part.
    Pdf { filename: String, bytes: Vec<u8> },
    /// A URL the server should fetch.
    Url(String),
}

impl DocumentSource {
    /// Value of the `type` form field.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentSource::Text(_) => "text",
            DocumentSource::Pdf { .. } => "pdf",
            DocumentSource::Url(_) => "url",
        }
    }
}

/// `POST /api/load-documents` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadDocumentsResponse {
    pub message: Option<String>,
    pub source: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_response_from_server_shape() {
        let body = json!({
            "response": "Peter has extensive experience with Python...",
            "conversation_id": "conv_123",
            "retrieved_context": [
                {"id": "doc_1", "text": "5 years Python experience", "similarity": 0.95}
            ],
            "timestamp": "2024-01-20T10:30:00Z"
        });

        let resp: ChatResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.conversation_id, "conv_123");
        assert_eq!(resp.retrieved_context.len(), 1);
        assert_eq!(resp.retrieved_context[0].similarity, 0.95);
        assert!(resp.timestamp.is_some());
        assert!(resp.metadata.is_none());
    }

    #[test]
    fn test_chat_response_naive_timestamp() {
        let body = json!({
            "response": "Hi",
            "conversation_id": "c",
            "retrieved_context": [],
            "timestamp": "2025-01-20T10:30:00.123456"
        });

        let resp: ChatResponse = serde_json::from_value(body).unwrap();
        let ts = resp.timestamp.unwrap();
        assert_eq!(ts.timestamp(), 1_737_369_000);
        assert_eq!(ts.timestamp_subsec_micros(), 123_456);
    }

    #[test]
    fn test_chat_response_unreadable_timestamp_is_dropped() {
        let body = json!({"response": "Hi", "timestamp": "last tuesday"});
        let resp: ChatResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.response, "Hi");
        assert!(resp.timestamp.is_none());

        let null: ChatResponse = serde_json::from_value(json!({"timestamp": null})).unwrap();
        assert!(null.timestamp.is_none());
    }

    #[test]
    fn test_response_types_accept_empty_object() {
        let resp: ChatResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.response.is_empty());

        let health: HealthResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!health.is_healthy());
    }

    #[test]
    fn test_chat_request_wire_names() {
        let req = ChatRequest {
            query: "hi".to_string(),
            conversation_id: "c1".to_string(),
            user_id: "u1".to_string(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"query": "hi", "conversation_id": "c1", "user_id": "u1"}));
    }

    #[test]
    fn test_cache_stats_both_shapes() {
        let flat: CacheStats = serde_json::from_value(json!({"size": 3, "totalSize": 2048})).unwrap();
        assert_eq!(flat.entries(), Some(3));
        assert_eq!(flat.total_size, Some(2048));

        let wrapped: CacheStats =
            serde_json::from_value(json!({"cache_stats": {"size": 7}, "status": "success"}))
                .unwrap();
        assert_eq!(wrapped.entries(), Some(7));
    }

    #[test]
    fn test_cleanup_result_alias() {
        let result: CleanupResult =
            serde_json::from_value(json!({"removed_count": 4, "status": "success"})).unwrap();
        assert_eq!(result.removed, 4);
    }

    #[test]
    fn test_vector_cache_info_keeps_unknown_fields() {
        let resp: VectorCacheInfoResponse = serde_json::from_value(json!({
            "vector_cache_info": {"cached_documents": 12, "cache_fresh": true, "backend": "firebase"}
        }))
        .unwrap();
        assert_eq!(resp.vector_cache_info.cached_documents, Some(12));
        assert_eq!(resp.vector_cache_info.extra["backend"], "firebase");
    }
}
