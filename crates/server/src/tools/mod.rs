//! MCP tool implementations.
//!
//! Each tool delivers one lifecycle event to the offline cache manager or
//! reports on its state.

pub mod activate;
pub mod fetch;
pub mod install;
pub mod status;

pub use fetch::WorkerFetchParams;

use offcache_core::Error;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

/// Serialize a tool output as pretty JSON text content.
fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, Error> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
