//! Named cache stores backed by SQLite.
//!
//! A cache store holds one generation of pre-cached responses. This module
//! provides the `CacheStorage` seam the offline cache manager talks to and
//! its SQLite implementation with async access via tokio-rusqlite:
//!
//! - Request-addressed entries keyed by a SHA-256 of method and URL
//! - Atomic multi-entry writes
//! - Cascading store deletion
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entry;
pub mod hash;
pub mod migrations;
pub mod storage;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use entry::{CacheRequest, CachedResponse};
pub use storage::CacheStorage;
