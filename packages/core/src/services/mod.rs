//! Business Services
//!
//! - `NodeService` - the tree mutation engine (create, update, move/shift, delete, list)
//! - `ColorPool` - round-robin color source for LOCATION/DEPARTMENT nodes
//! - `ForestCache` - cache-aside wrapper for the full-forest listing
//!
//! Services coordinate between the store, the cache and callers, enforcing
//! the hierarchy rules (no cycles, color inheritance, no orphans).

pub mod color_pool;
pub mod error;
pub mod forest_cache;
pub mod node_service;

pub use color_pool::{ColorPool, EmptyPalette, PoolColor, DEFAULT_PALETTE};
pub use error::{ErrorKind, NodeServiceError};
pub use forest_cache::{ForestCache, DEFAULT_FOREST_TTL, FOREST_CACHE_KEY};
pub use node_service::{DeleteResult, NodeService, PropagationReport};
