//! Full-forest snapshot cache
//!
//! Memoizes the result of `get_all_nodes` under a single key.
//!
//! The snapshot is stored as the flat pre-order node list and nested again on
//! read, so its encoded depth does not grow with the depth of the hierarchy.
//!
//! # Cache Invalidation
//!
//! - **Event-driven**: every successful mutation deletes the snapshot
//! - **Time-based**: the snapshot expires after the TTL (1 hour by default)
//!
//! # Degraded backends
//!
//! The store is the source of truth. A backend error or an undecodable
//! payload on read counts as a miss; a failed write or invalidation is logged
//! and swallowed so it never fails the surrounding request.

use crate::cache::CacheStore;
use crate::models::{Node, NodeTree};
use std::sync::Arc;
use std::time::Duration;

/// Key the forest snapshot is stored under
pub const FOREST_CACHE_KEY: &str = "all_nodes";

/// Default snapshot lifetime
pub const DEFAULT_FOREST_TTL: Duration = Duration::from_secs(3600);

/// Cache-aside wrapper for the forest listing
#[derive(Clone)]
pub struct ForestCache {
    backend: Arc<dyn CacheStore>,
    key: String,
    ttl: Duration,
}

impl ForestCache {
    pub fn new(backend: Arc<dyn CacheStore>) -> Self {
        Self::with_ttl(backend, DEFAULT_FOREST_TTL)
    }

    /// Create a cache with custom TTL (primarily for testing)
    pub fn with_ttl(backend: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            backend,
            key: FOREST_CACHE_KEY.to_string(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Cached forest, or `None` on a miss or any backend/decoding problem
    pub async fn get(&self) -> Option<Vec<NodeTree>> {
        let bytes = match self.backend.get(&self.key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!("Forest cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!("Forest cache read failed, falling back to store: {}", e);
                return None;
            }
        };

        match serde_json::from_slice::<Vec<Node>>(&bytes) {
            Ok(nodes) => {
                tracing::debug!("Forest cache hit ({} nodes, {} bytes)", nodes.len(), bytes.len());
                Some(NodeTree::build_forest(nodes))
            }
            Err(e) => {
                tracing::warn!("Discarding undecodable forest snapshot: {}", e);
                None
            }
        }
    }

    /// Store a fresh snapshot with the configured TTL
    pub async fn put(&self, forest: &[NodeTree]) {
        let bytes = match serde_json::to_vec(&NodeTree::flatten_forest(forest)) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to encode forest snapshot: {}", e);
                return;
            }
        };

        if let Err(e) = self.backend.set_with_expiry(&self.key, bytes, self.ttl).await {
            tracing::warn!("Failed to store forest snapshot: {}", e);
        }
    }

    /// Drop the snapshot so the next read recomputes from the store
    ///
    /// Returns `false` when the backend refused; the mutation that triggered
    /// the invalidation still stands.
    pub async fn invalidate(&self) -> bool {
        match self.backend.delete(&self.key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to invalidate forest cache: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, InMemoryCacheStore};
    use crate::models::{Node, NodeType, DEFAULT_COLOR};
    use async_trait::async_trait;

    struct DownCache;

    #[async_trait]
    impl CacheStore for DownCache {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::unavailable("connection refused"))
        }

        async fn set_with_expiry(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::unavailable("connection refused"))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::unavailable("connection refused"))
        }
    }

    fn forest() -> Vec<NodeTree> {
        vec![NodeTree::leaf(Node {
            id: 1,
            name: "Root Node".to_string(),
            node_type: NodeType::Organization,
            color: DEFAULT_COLOR.to_string(),
            parent_id: None,
        })]
    }

    #[tokio::test]
    async fn test_put_get_invalidate() {
        let cache = ForestCache::new(Arc::new(InMemoryCacheStore::new()));
        assert_eq!(cache.key(), "all_nodes");
        assert_eq!(cache.ttl(), Duration::from_secs(3600));
        assert!(cache.get().await.is_none());

        cache.put(&forest()).await;
        assert_eq!(cache.get().await, Some(forest()));

        assert!(cache.invalidate().await);
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_garbage_payload_is_a_miss() {
        let backend = Arc::new(InMemoryCacheStore::new());
        backend
            .set_with_expiry(FOREST_CACHE_KEY, b"not json".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        let cache = ForestCache::new(backend);
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_deep_chain_survives_the_round_trip() {
        let chain: Vec<Node> = (1..=200)
            .map(|id| Node {
                id,
                name: format!("Level {}", id),
                node_type: NodeType::Employee,
                color: DEFAULT_COLOR.to_string(),
                parent_id: (id > 1).then(|| id - 1),
            })
            .collect();
        let deep = NodeTree::build_forest(chain);
        assert_eq!(deep[0].size(), 200);

        let cache = ForestCache::new(Arc::new(InMemoryCacheStore::new()));
        cache.put(&deep).await;
        assert_eq!(cache.get().await, Some(deep));
    }

    #[tokio::test]
    async fn test_unavailable_backend_degrades() {
        let cache = ForestCache::new(Arc::new(DownCache));
        cache.put(&forest()).await;
        assert!(cache.get().await.is_none());
        assert!(!cache.invalidate().await);
    }
}
