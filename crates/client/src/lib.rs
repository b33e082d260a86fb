//! Client code for offcache.
//!
//! This crate provides the network transport, URL resolution and the
//! offline cache manager that hosts drive through lifecycle events.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchConfig, HttpNetwork, Network, NetworkError, NetworkResponse};
pub use worker::{
    ActivationReport, ClientControl, FetchOutcome, InstallReport, LifecyclePhase, OfflineCacheManager,
    ResponseSource, WorkerConfig, WorkerStatus,
};
