//! worker_install tool implementation.
//!
//! Delivers the install event: pre-caches the asset manifest into the
//! current cache generation.

use offcache_client::OfflineCacheManager;
use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::json_result;

/// Implementation of the worker_install tool.
pub async fn install_impl(manager: &OfflineCacheManager) -> Result<CallToolResult, McpError> {
    let report = manager.on_install().await?;
    Ok(json_result(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{fixture, output_json};
    use offcache_client::worker::{CACHE_NAME, PRECACHE_MANIFEST};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_install_reports_cached_assets() {
        let f = fixture().await;

        let result = install_impl(&f.manager).await.unwrap();
        let output = output_json(&result);

        assert_eq!(output["cache_name"], CACHE_NAME);
        assert_eq!(output["cached"], PRECACHE_MANIFEST.len());
        assert!(f.clients.waiting_skipped());
    }

    #[tokio::test]
    async fn test_install_offline_is_error() {
        let f = fixture().await;
        f.network.offline.store(true, Ordering::SeqCst);

        let err = install_impl(&f.manager).await.unwrap_err();
        assert_eq!(err.code.0, -32020);
    }
}
