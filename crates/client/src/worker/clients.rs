//! Client-control seam.

/// Control over the pages a worker serves.
#[async_trait::async_trait]
pub trait ClientControl: Send + Sync {
    /// Activate as soon as installation finishes instead of waiting for the
    /// previous version's pages to close.
    async fn skip_waiting(&self);

    /// Take control of pages that are already open.
    async fn claim(&self);
}
