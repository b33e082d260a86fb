//! Host-side client control.
//!
//! The host has no pages of its own; it records the manager's requests so
//! they can be reported through `cache_status`.

use std::sync::atomic::{AtomicBool, Ordering};

use offcache_client::ClientControl;

#[derive(Debug, Default)]
pub struct HostClients {
    waiting_skipped: AtomicBool,
    clients_claimed: AtomicBool,
}

impl HostClients {
    pub fn waiting_skipped(&self) -> bool {
        self.waiting_skipped.load(Ordering::SeqCst)
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ClientControl for HostClients {
    async fn skip_waiting(&self) {
        tracing::debug!("worker asked to skip waiting");
        self.waiting_skipped.store(true, Ordering::SeqCst);
    }

    async fn claim(&self) {
        tracing::debug!("worker claimed open clients");
        self.clients_claimed.store(true, Ordering::SeqCst);
    }
}
