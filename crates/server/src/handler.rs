//! MCP server handler implementation.
//!
//! This module defines the host adapter that delivers lifecycle events to
//! the offline cache manager as tool calls.
use std::sync::Arc;

use crate::host::HostClients;
use crate::tools::{
    WorkerFetchParams, activate::activate_impl, fetch::fetch_impl, install::install_impl, status::status_impl,
};

use offcache_client::{Network, OfflineCacheManager};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for offcache.
#[derive(Clone)]
pub struct OfflineCacheServer {
    manager: Arc<OfflineCacheManager>,
    network: Arc<dyn Network>,
    clients: Arc<HostClients>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl OfflineCacheServer {
    /// Create a new server handler.
    pub fn new(manager: Arc<OfflineCacheManager>, network: Arc<dyn Network>, clients: Arc<HostClients>) -> Self {
        Self { manager, network, clients, tool_router: Self::tool_router() }
    }

    #[tool(description = "Deliver the install event: pre-cache every manifest asset into the current cache generation.")]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.manager).await
    }

    #[tool(description = "Deliver the activate event: delete every cache generation except the current one.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.manager).await
    }

    /// Deliver a fetch event.
    ///
    /// GET requests are answered cache-first, then from the network, then with the
    /// offline page. Other methods are passed through to default network handling.
    #[tool(description = "Deliver a fetch event for a URL. Returns the response and whether it came from the cache, the network or the offline page.")]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.manager, self.network.as_ref(), params.0).await
    }

    #[tool(description = "Report the worker lifecycle phase, cache generations and entry count.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.manager, &self.clients).await
    }
}

impl ServerHandler for OfflineCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "offcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
