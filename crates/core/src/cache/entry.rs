//! Request and response records held by a cache store.

use super::hash::compute_cache_key;
use serde::{Deserialize, Serialize};

/// A request as seen by the cache: method plus absolute URL.
///
/// Two requests address the same entry iff their methods and URLs are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheRequest {
    pub method: String,
    pub url: String,
}

impl CacheRequest {
    /// Build a request, upper-casing the method.
    pub fn new(method: impl AsRef<str>, url: impl Into<String>) -> Self {
        Self { method: method.as_ref().trim().to_ascii_uppercase(), url: url.into() }
    }

    /// Shorthand for a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Whether the request only reads. Only `GET` is intercepted.
    pub fn is_read(&self) -> bool {
        self.method == "GET"
    }

    /// Storage key of this request.
    pub fn cache_key(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

/// A stored response snapshot.
///
/// Written once when a generation is populated and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedResponse {
    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
