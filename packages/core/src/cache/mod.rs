//! Cache Layer
//!
//! A byte-oriented key/value contract with per-entry expiry. The engine only
//! uses it through [`crate::services::ForestCache`], which owns the single
//! key under which the full-forest listing is memoized.
//!
//! Backends report transport problems as [`CacheError::Unavailable`]; callers
//! treat those as a miss on reads and as a warning on invalidation, never as
//! a failed request.

mod memory;

pub use memory::{CacheStats, InMemoryCacheStore};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Cache backend errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend could not be reached or refused the operation
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Key/value store with expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` on a miss, including expired entries
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set_with_expiry(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
