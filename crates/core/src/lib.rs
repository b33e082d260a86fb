//! Core types and shared functionality for offcache.
//!
//! This crate provides:
//! - Named cache stores (cache generations) with a SQLite backend
//! - The `CacheStorage` seam used by the offline cache manager
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheRequest, CacheStorage, CachedResponse};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
