//! Request-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Compute the key of a cached entry from its request method and URL.
///
/// Callers pass the method already upper-cased and the URL already resolved
/// and stripped of its fragment.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
