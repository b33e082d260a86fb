//! Cache storage seam.

use super::entry::{CacheRequest, CachedResponse};
use crate::Error;

/// Named cache stores, as consumed by the offline cache manager.
///
/// A written entry must become visible atomically: `put_all` either stores
/// every entry or none of them.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the store with the given name, creating it if absent.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Names of all existing stores, oldest first.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a store and all its entries. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Look up the entry for a request in the named store.
    async fn match_request(&self, name: &str, request: &CacheRequest) -> Result<Option<CachedResponse>, Error>;

    /// Store all entries in the named store, replacing existing ones wholesale.
    async fn put_all(&self, name: &str, entries: Vec<(CacheRequest, CachedResponse)>) -> Result<(), Error>;

    /// Number of entries in the named store (0 if the store does not exist).
    async fn entry_count(&self, name: &str) -> Result<u64, Error>;
}
