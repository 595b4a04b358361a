//! API client for the remote conversational service.
//!
//! [`ApiClient`] mediates every call to the service and presents one
//! success/error contract regardless of how the transport fails:
//!
//! - each request races a deadline timer; the loser is dropped, which aborts
//!   the underlying connection
//! - issuing a request cancels any request still pending on the same instance,
//!   so at most one request per instance is ever live
//! - non-2xx responses, transport failures and timeouts all surface as [`ApiError`]
//!
//! # Example
//!
//! ```no_run
//! use parley::client::ApiClient;
//! use parley::config::ApiConfig;
//!
//! # async fn run() -> Result<(), parley::client::ApiError> {
//! let client = ApiClient::new(&ApiConfig::default());
//! if client.health_check().await {
//!     let reply = client.send_message("What does Peter work on?", "conv_1", "web_user").await?;
//!     println!("{}", reply.response);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod types;

pub use error::ApiError;
pub use reqwest::Method;
pub use types::{
    CacheAck, CacheStats, ChatRequest, ChatResponse, CleanupResult, DocumentSource,
    HealthResponse, LoadDocumentsResponse, ResponseMetadata, RetrievedContext, VectorCacheInfo,
    VectorCacheInfoResponse,
};

use crate::config::ApiConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Endpoint paths used by the typed operations.
pub mod endpoints {
    pub const HEALTH: &str = "/health";
    pub const CACHE_STATS: &str = "/admin/cache/stats";
    pub const CACHE_CLEAR: &str = "/admin/cache/clear";
    pub const CACHE_CLEANUP: &str = "/admin/cache/cleanup";
    pub const VECTOR_CACHE_INFO: &str = "/admin/vector-cache/info";
    pub const LOAD_DOCUMENTS: &str = "/api/load-documents";
}

/// Per-call options for [`ApiClient::request`].
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Extra headers; these override the defaults on name collision.
    pub headers: HashMap<String, String>,
    /// Deadline override for this call.
    pub timeout: Option<Duration>,
    /// Sent as `Authorization: Bearer <token>`.
    pub bearer_token: Option<String>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// Handle to the single request allowed in flight per client.
#[derive(Default)]
struct PendingSlot {
    generation: u64,
    token: Option<CancellationToken>,
}

/// Client for the chat API.
///
/// Cheap to construct from a shared [`reqwest::Client`]; use [`ApiClient::sibling`]
/// when an independent request lane is needed (for example, health polling that
/// must not cancel an in-flight chat request).
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    chat_path: String,
    max_message_length: usize,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
    pending: Mutex<PendingSlot>,
}

impl ApiClient {
    /// Create a client with its own connection pool.
    pub fn new(config: &ApiConfig) -> Self {
        Self::with_client(config, Arc::new(Client::new()))
    }

    /// Create a client on top of an existing HTTP client.
    pub fn with_client(config: &ApiConfig, client: Arc<Client>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms()),
            chat_path: config.chat_path.clone(),
            max_message_length: config.max_message_length,
            client,
            pending: Mutex::new(PendingSlot::default()),
        }
    }

    /// A client with the same settings and connection pool but its own pending slot.
    pub fn sibling(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            chat_path: self.chat_path.clone(),
            max_message_length: self.max_message_length,
            client: Arc::clone(&self.client),
            pending: Mutex::new(PendingSlot::default()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    /// Abort the pending request, if any. Returns whether one was cancelled.
    pub fn cancel(&self) -> bool {
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.token.take() {
            Some(token) => {
                token.cancel();
                tracing::debug!(base_url = %self.base_url, "Pending request cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether a request is currently in flight on this instance.
    pub fn has_pending(&self) -> bool {
        let slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        slot.token.is_some()
    }

    // ========================================================================
    // Typed operations
    // ========================================================================

    /// Check service health.
    ///
    /// Returns `true` only when the service answers `{"status": "healthy"}`.
    /// Every failure mode is reported as `false`.
    pub async fn health_check(&self) -> bool {
        match self
            .get::<HealthResponse>(endpoints::HEALTH, RequestConfig::default())
            .await
        {
            Ok(health) => health.is_healthy(),
            Err(e) => {
                tracing::debug!(error = %e, "Health check failed");
                false
            }
        }
    }

    /// Send a chat message.
    ///
    /// The query is trimmed and must be non-empty and no longer than the
    /// configured maximum; violations fail locally without a network call.
    /// Blank conversation or user ids are replaced with session defaults.
    pub async fn send_message(
        &self,
        query: &str,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<ChatResponse, ApiError> {
        let query = self.validate_query(query)?;

        let conversation_id = if conversation_id.trim().is_empty() {
            format!("web_chat_{}", chrono::Utc::now().timestamp_millis())
        } else {
            conversation_id.to_string()
        };
        let user_id = if user_id.trim().is_empty() {
            crate::config::DEFAULT_USER_ID.to_string()
        } else {
            user_id.to_string()
        };

        let request = ChatRequest {
            query,
            conversation_id,
            user_id,
        };

        let chat_path = self.chat_path.clone();
        self.post(&chat_path, Some(&request), RequestConfig::default())
            .await
    }

    /// Fetch response cache statistics (admin).
    pub async fn cache_stats(&self, token: &str) -> Result<CacheStats, ApiError> {
        let config = Self::admin_config(token)?;
        self.get(endpoints::CACHE_STATS, config).await
    }

    /// Clear all cached responses (admin). Safe to call repeatedly.
    pub async fn clear_caches(&self, token: &str) -> Result<CacheAck, ApiError> {
        let config = Self::admin_config(token)?;
        self.post::<CacheAck, Value>(endpoints::CACHE_CLEAR, None, config)
            .await
    }

    /// Remove expired cache entries (admin).
    pub async fn cleanup_caches(&self, token: &str) -> Result<CleanupResult, ApiError> {
        let config = Self::admin_config(token)?;
        self.post::<CleanupResult, Value>(endpoints::CACHE_CLEANUP, None, config)
            .await
    }

    /// Fetch vector store cache metadata (admin).
    pub async fn vector_cache_info(
        &self,
        token: &str,
    ) -> Result<VectorCacheInfoResponse, ApiError> {
        let config = Self::admin_config(token)?;
        self.get(endpoints::VECTOR_CACHE_INFO, config).await
    }

    /// Upload source material to the knowledge base as a multipart form.
    pub async fn load_documents(
        &self,
        source: DocumentSource,
        config: RequestConfig,
    ) -> Result<LoadDocumentsResponse, ApiError> {
        let form = Self::document_form(source)?;
        let url = self.url_for(endpoints::LOAD_DOCUMENTS);
        let timeout = config.timeout.unwrap_or(self.timeout);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self::merge_headers(&mut headers, &config)?;

        let req = self.client.post(&url).headers(headers).multipart(form);
        let response: LoadDocumentsResponse =
            self.dispatch(req, Method::POST, &url, timeout).await?;

        // The loader reports some failures in a 2xx body.
        if let Some(error) = response.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(ApiError::Http {
                status: 200,
                message: error.to_string(),
                code: None,
                details: Map::new(),
            });
        }

        Ok(response)
    }

    // ========================================================================
    // Generic HTTP methods
    // ========================================================================

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<T, ApiError> {
        self.request::<T, Value>(Method::GET, path, None, config)
            .await
    }

    pub async fn post<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, body, config).await
    }

    pub async fn put<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, body, config).await
    }

    pub async fn patch<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, body, config).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<T, ApiError> {
        self.request::<T, Value>(Method::DELETE, path, None, config)
            .await
    }

    /// Shared request core.
    ///
    /// Builds the URL from the base, merges default JSON headers with the
    /// caller's, attaches the bearer token, serializes `body` for POST/PUT/PATCH
    /// and runs the call under the deadline.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url_for(path);
        let timeout = config.timeout.unwrap_or(self.timeout);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self::merge_headers(&mut headers, &config)?;

        let mut req = self.client.request(method.clone(), &url).headers(headers);

        let mutating = method == Method::POST || method == Method::PUT || method == Method::PATCH;
        if let (true, Some(body)) = (mutating, body) {
            let payload = serde_json::to_vec(body).map_err(|e| ApiError::Validation {
                message: format!("Failed to serialize request body: {}", e),
                field: Some("body"),
            })?;
            req = req.body(payload);
        }

        self.dispatch(req, method, &url, timeout).await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn validate_query(&self, query: &str) -> Result<String, ApiError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(ApiError::validation("query", "Message cannot be empty"));
        }
        if trimmed.chars().count() > self.max_message_length {
            return Err(ApiError::validation(
                "query",
                format!(
                    "Message cannot exceed {} characters",
                    self.max_message_length
                ),
            ));
        }
        Ok(trimmed.to_string())
    }

    fn admin_config(token: &str) -> Result<RequestConfig, ApiError> {
        if token.trim().is_empty() {
            return Err(ApiError::validation(
                "token",
                "An authentication token is required for admin operations",
            ));
        }
        Ok(RequestConfig::default().bearer(token.trim()))
    }

    fn document_form(source: DocumentSource) -> Result<Form, ApiError> {
        let form = Form::new().text("type", source.kind());
        match source {
            DocumentSource::Text(content) => {
                let content = content.trim().to_string();
                if content.is_empty() {
                    return Err(ApiError::validation("content", "Document text cannot be empty"));
                }
                Ok(form.text("content", content))
            }
            DocumentSource::Url(url) => {
                let url = url.trim().to_string();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ApiError::validation(
                        "url",
                        "URL must start with http:// or https://",
                    ));
                }
                Ok(form.text("url", url))
            }
            DocumentSource::Pdf { filename, bytes } => {
                if bytes.is_empty() {
                    return Err(ApiError::validation("file", "PDF file is empty"));
                }
                let part = Part::bytes(bytes)
                    .file_name(filename)
                    .mime_str("application/pdf")
                    .map_err(|e| ApiError::validation("file", e.to_string()))?;
                Ok(form.part("file", part))
            }
        }
    }

    fn merge_headers(headers: &mut HeaderMap, config: &RequestConfig) -> Result<(), ApiError> {
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::validation("headers", format!("{}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::validation("headers", format!("{}: {}", name, e)))?;
            headers.insert(name, value);
        }

        if let Some(token) = &config.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::validation("token", e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(())
    }

    /// Register a new pending request, cancelling the previous one.
    fn begin(&self) -> (u64, CancellationToken) {
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.token.take() {
            previous.cancel();
            tracing::debug!(base_url = %self.base_url, "Superseded pending request");
        }
        slot.generation = slot.generation.wrapping_add(1);
        let token = CancellationToken::new();
        slot.token = Some(token.clone());
        (slot.generation, token)
    }

    /// Release the pending slot if it still belongs to `generation`.
    fn finish(&self, generation: u64) {
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.generation == generation {
            slot.token = None;
        }
    }

    /// Run a prepared request under the deadline and the supersede token.
    ///
    /// Whichever branch loses the race is dropped, which drops the reqwest
    /// future and closes its connection.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        method: Method,
        url: &str,
        timeout: Duration,
    ) -> Result<T, ApiError> {
        let (generation, token) = self.begin();
        let start = Instant::now();
        tracing::debug!(method = %method, url = %url, timeout_ms = timeout.as_millis() as u64, "Sending request");

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(ApiError::Cancelled),
            _ = tokio::time::sleep(timeout) => Err(ApiError::Timeout(timeout.as_millis() as u64)),
            result = Self::exchange::<T>(req, timeout) => result,
        };

        self.finish(generation);

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                tracing::debug!(method = %method, url = %url, duration_ms, "Request succeeded")
            }
            Err(ApiError::Cancelled) => {
                tracing::debug!(method = %method, url = %url, duration_ms, "Request cancelled")
            }
            Err(e) => tracing::warn!(
                method = %method,
                url = %url,
                duration_ms,
                status = e.status(),
                code = e.code(),
                error = %e,
                "Request failed"
            ),
        }

        result
    }

    /// Send the request and decode the response body.
    async fn exchange<T: DeserializeOwned>(
        req: RequestBuilder,
        timeout: Duration,
    ) -> Result<T, ApiError> {
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(timeout.as_millis() as u64)
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let body = serde_json::from_slice::<Value>(&bytes).ok();
            return Err(error::http_error(
                status.as_u16(),
                status.canonical_reason(),
                body.as_ref(),
            ));
        }

        if !is_json || bytes.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_value(Value::Object(Map::new())).map_err(|e| {
                ApiError::InvalidResponse(format!("Empty response not accepted: {}", e))
            });
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}
