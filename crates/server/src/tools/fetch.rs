//! worker_fetch tool implementation.
//!
//! Delivers a fetch event. Requests the manager passes through (anything
//! but GET, or any request before activation) are handled
//! the way a host handles any unintercepted request: straight to the network.

use offcache_client::{FetchOutcome, Network, OfflineCacheManager};
use offcache_core::{CachedResponse, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL, or a path relative to the configured origin.
    pub url: String,

    /// HTTP method (default: GET). Only GET is intercepted.
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    /// Resolved request URL.
    pub url: String,
    /// Request method.
    pub method: String,
    /// "worker" if the manager responded, "host_default" if it passed through.
    pub handled_by: String,
    /// Fallback step that produced the response when the worker handled it:
    /// "cache", "network", "offline_fallback" or "unavailable".
    pub source: Option<String>,
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body, lossily decoded as UTF-8.
    pub body: String,
}

impl WorkerFetchOutput {
    fn new(response: CachedResponse, method: String, handled_by: &str, source: Option<String>) -> Self {
        Self {
            url: response.url,
            method,
            handled_by: handled_by.to_string(),
            source,
            status: response.status,
            headers: response.headers,
            body: String::from_utf8_lossy(&response.body).to_string(),
        }
    }
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(
    manager: &OfflineCacheManager, network: &dyn Network, params: WorkerFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }

    let request = manager.request(&params.method, &params.url)?;

    let output = match manager.on_fetch(&request).await {
        FetchOutcome::Respond { response, source } => {
            let source = serde_json::to_value(source)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string));
            WorkerFetchOutput::new(response, request.method, "worker", source)
        }
        FetchOutcome::PassThrough => {
            tracing::debug!(method = %request.method, url = %request.url, "default handling");
            let response = network
                .fetch(&request)
                .await
                .map_err(|e| Error::Network(e.to_string()))?;
            WorkerFetchOutput::new(response.into_cached(), request.method, "host_default", None)
        }
    };

    Ok(json_result(&output)?)
}
