//! worker_activate tool implementation.
//!
//! Delivers the activate event: prunes stale cache generations and claims
//! open clients.

use offcache_client::OfflineCacheManager;
use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::json_result;

/// Implementation of the worker_activate tool.
pub async fn activate_impl(manager: &OfflineCacheManager) -> Result<CallToolResult, McpError> {
    let report = manager.on_activate().await?;
    Ok(json_result(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::install::install_impl;
    use crate::tools::testing::{fixture, output_json};

    #[tokio::test]
    async fn test_activate_before_install() {
        let f = fixture().await;
        let err = activate_impl(&f.manager).await.unwrap_err();
        assert_eq!(err.code.0, -32022);
        assert!(!f.clients.clients_claimed());
    }

    #[tokio::test]
    async fn test_activate_after_install() {
        let f = fixture().await;
        install_impl(&f.manager).await.unwrap();

        let result = activate_impl(&f.manager).await.unwrap();
        let output = output_json(&result);

        assert_eq!(output["deleted"].as_array().unwrap().len(), 0);
        assert_eq!(output["failed"].as_array().unwrap().len(), 0);
        assert!(f.clients.clients_claimed());
    }
}
