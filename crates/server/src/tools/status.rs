//! cache_status tool implementation.
//!
//! Reports the lifecycle phase, the cache generations on disk and the
//! host's client-control flags.

use offcache_client::OfflineCacheManager;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::host::HostClients;

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    /// Lifecycle phase of the worker.
    pub phase: String,
    /// Name of the current cache generation.
    pub cache_name: String,
    /// All cache generations present, oldest first.
    pub stores: Vec<String>,
    /// Entries in the current generation.
    pub entries: u64,
    /// Whether the worker asked to skip waiting.
    pub waiting_skipped: bool,
    /// Whether the worker claimed open clients.
    pub clients_claimed: bool,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(manager: &OfflineCacheManager, clients: &HostClients) -> Result<CallToolResult, McpError> {
    let status = manager.status().await?;

    let output = CacheStatusOutput {
        phase: status.phase.to_string(),
        cache_name: status.cache_name,
        stores: status.stores,
        entries: status.entries,
        waiting_skipped: clients.waiting_skipped(),
        clients_claimed: clients.clients_claimed(),
    };

    Ok(json_result(&output)?)
}
