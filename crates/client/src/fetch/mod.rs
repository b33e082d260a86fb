//! Network access for the offline cache manager.
//!
//! ### Network seam
//! - `Network` is the only way the manager reaches the network, so hosts and
//!   tests can substitute their own transport.
//!
//! ### HTTP transport
//! - `HttpNetwork` issues requests with reqwest.
//! - Any HTTP status is a successful response; only transport failures
//!   (connect, DNS, TLS, reset, timeout) are errors.
//! - Max redirects: 5 (configurable)
//! - No timeout unless one is configured.
//!
//! ### URL resolution
//! - Relative targets resolve against the worker origin; fragments are dropped.

pub mod url;

use bytes::Bytes;
use reqwest::{Client, Method, StatusCode, Url, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, resolve};

use offcache_core::{CacheRequest, CachedResponse};

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "offcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: none)
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "offcache/0.1".to_string(), timeout: None, max_redirects: 5 }
    }
}

impl From<&offcache_core::AppConfig> for FetchConfig {
    fn from(config: &offcache_core::AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), max_redirects: config.max_redirects }
    }
}

/// Network-level failure. HTTP error statuses are not represented here.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// The request could not be built (bad method or URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timeout")]
    Timeout,

    /// Connectivity failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_builder() {
            NetworkError::InvalidRequest(err.to_string())
        } else {
            NetworkError::Transport(err.to_string())
        }
    }
}

/// Response from the network, whatever its status.
#[derive(Debug, Clone)]
pub struct NetworkResponse {
    /// The URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl NetworkResponse {
    /// Headers as owned name/value pairs. Values that are not valid
    /// visible ASCII are dropped.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect()
    }

    /// Snapshot this response for storage, keyed under the requested URL.
    pub fn into_cached(self) -> CachedResponse {
        let headers = self.header_pairs();
        CachedResponse {
            url: self.url.to_string(),
            status: self.status.as_u16(),
            headers,
            body: self.bytes.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Outbound network access.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Issue a request and return whatever the server answers.
    async fn fetch(&self, request: &CacheRequest) -> Result<NetworkResponse, NetworkError>;
}

/// reqwest-backed network transport.
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new transport with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, NetworkError> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| NetworkError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &CacheRequest) -> Result<NetworkResponse, NetworkError> {
        let start = Instant::now();
        let url = Url::parse(&request.url).map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;
        let method =
            Method::from_bytes(request.method.as_bytes()).map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;

        let response = self.http.request(method, url.clone()).send().await?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            method = %request.method,
            url = %url,
            final_url = %final_url,
            status = status.as_u16(),
            fetch_ms,
            bytes = bytes.len(),
            "network fetch complete"
        );

        Ok(NetworkResponse { url, final_url, status, headers, bytes, fetch_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "offcache/0.1");
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = offcache_core::AppConfig {
            user_agent: "dash/2".into(),
            timeout_ms: Some(2500),
            max_redirects: 2,
            ..Default::default()
        };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "dash/2");
        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.max_redirects, 2);
    }

    #[test]
    fn test_into_cached_keeps_error_status() {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/plain"));
        let response = NetworkResponse {
            url: Url::parse("http://localhost:3000/missing").unwrap(),
            final_url: Url::parse("http://localhost:3000/missing").unwrap(),
            status: StatusCode::NOT_FOUND,
            headers,
            bytes: Bytes::from_static(b"not found"),
            fetch_ms: 3,
        };

        let cached = response.into_cached();
        assert_eq!(cached.status, 404);
        assert_eq!(cached.url, "http://localhost:3000/missing");
        assert_eq!(cached.header("content-type"), Some("text/plain"));
        assert_eq!(cached.body, b"not found");
    }

    #[tokio::test]
    async fn test_http_network_new() {
        let network = HttpNetwork::new(FetchConfig::default());
        assert!(network.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_method_rejected() {
        let network = HttpNetwork::new(FetchConfig::default()).unwrap();
        let request = CacheRequest::new("BAD METHOD", "http://localhost:3000/");
        let result = network.fetch(&request).await;
        assert!(matches!(result, Err(NetworkError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let network = HttpNetwork::new(FetchConfig::default()).unwrap();
        let request = CacheRequest::get("http://127.0.0.1:9/");
        let result = network.fetch(&request).await;
        assert!(matches!(result, Err(NetworkError::Transport(_))));
    }
}
