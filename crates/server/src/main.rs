//! offcache host entry point.
//!
//! Loads configuration, opens the cache database, builds the offline cache
//! manager and serves its lifecycle events as MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use offcache_client::{FetchConfig, HttpNetwork, Network, OfflineCacheManager, WorkerConfig};
use offcache_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod host;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    tracing::info!(
        origin = %config.origin,
        db_path = %config.db_path.display(),
        "Starting offcache host on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(FetchConfig::from(&config))?);
    let clients = Arc::new(host::HostClients::default());

    let worker = WorkerConfig::new(config.origin_url()?);
    let manager = Arc::new(OfflineCacheManager::new(worker, Arc::new(db), network.clone(), clients.clone())?);

    let handler = handler::OfflineCacheServer::new(manager, network, clients);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
