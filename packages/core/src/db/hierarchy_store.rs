//! HierarchyStore Trait - Persistence Abstraction
//!
//! This module defines the `HierarchyStore` trait that sits between the tree
//! mutation engine ([`crate::services::NodeService`]) and whatever physically
//! stores the hierarchy. The engine never issues raw queries; it only speaks
//! this contract.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: every method is async so embedded and networked
//!    backends share one seam
//! 2. **Explicit tree queries**: ancestors, descendants and the full forest
//!    are first-class operations instead of lazily loaded relations, so the
//!    backend is free to index ancestry however it likes (adjacency list,
//!    closure table, path enumeration)
//! 3. **Store-side cycle guard**: `save_node` re-checks ancestry in the same
//!    unit of work that rewrites the parent edge and rejects cycles with
//!    [`DatabaseError::CycleRejected`]
//! 4. **Column-level writes**: `patch_node` touches only the columns a
//!    [`NodePatch`] sets, so cascading writes such as color propagation
//!    cannot undo a concurrent move
//!
//! # Examples
//!
//! ```rust,no_run
//! use orgtree_core::db::{HierarchyStore, SqliteHierarchyStore};
//! use orgtree_core::models::{NewNode, NodeType};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store: Arc<dyn HierarchyStore> =
//!         Arc::new(SqliteHierarchyStore::open(PathBuf::from("./data/orgtree.db")).await?);
//!
//!     let root = store.create_node(NewNode::implicit_root()).await?;
//!     let ancestors = store.get_ancestors(root.id).await?;
//!     assert!(ancestors.is_empty());
//!     Ok(())
//! }
//! ```

use crate::db::DatabaseError;
use crate::models::{NewNode, Node, NodeId, NodePatch, NodeTree, NodeWithRelations};
use async_trait::async_trait;

/// Result alias for store operations
pub type StoreResult<T> = Result<T, DatabaseError>;

/// Abstraction layer for hierarchy persistence
///
/// Implementations must be `Send + Sync` so a single store can be shared by
/// concurrent requests behind an `Arc`.
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    /// Insert a node and assign its id
    ///
    /// # Errors
    ///
    /// Fails if `parent_id` does not reference an existing node.
    async fn create_node(&self, node: NewNode) -> StoreResult<Node>;

    /// Persist every field of an existing node (upsert by id)
    ///
    /// When `parent_id` differs from the stored value the parent edge and all
    /// derived ancestry rows are rewritten atomically.
    ///
    /// # Errors
    ///
    /// - [`DatabaseError::NotPersisted`] if the id (or the new parent) is unknown
    /// - [`DatabaseError::CycleRejected`] if the new parent lies in the node's subtree
    async fn save_node(&self, node: &Node) -> StoreResult<Node>;

    /// Write only the columns set in `patch`, returning the node as stored
    ///
    /// Unset columns keep their current stored value even if it changed
    /// after the caller last read the node. Setting `parent_id` rewrites
    /// ancestry exactly like [`HierarchyStore::save_node`].
    ///
    /// # Errors
    ///
    /// Same as [`HierarchyStore::save_node`].
    async fn patch_node(&self, id: NodeId, patch: &NodePatch) -> StoreResult<Node>;

    /// Get node by id, `Ok(None)` when it does not exist
    async fn get_node(&self, id: NodeId) -> StoreResult<Option<Node>>;

    /// Get a node together with its parent and direct children
    async fn get_node_with_relations(&self, id: NodeId) -> StoreResult<Option<NodeWithRelations>>;

    /// Every node below `id`, excluding `id` itself, ordered by depth then id
    async fn get_descendants(&self, id: NodeId) -> StoreResult<Vec<Node>>;

    /// Every node above `id`, nearest parent first
    async fn get_ancestors(&self, id: NodeId) -> StoreResult<Vec<Node>>;

    /// All roots with their nested subtrees, roots and siblings ordered by id
    async fn get_forest(&self) -> StoreResult<Vec<NodeTree>>;

    /// Delete a node and its entire subtree, returning the number of nodes removed
    async fn delete_node(&self, id: NodeId) -> StoreResult<u64>;
}
