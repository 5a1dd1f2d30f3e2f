//! Database Layer
//!
//! This module handles all hierarchy persistence:
//!
//! - [`HierarchyStore`] - the async contract the engine consumes
//! - [`DatabaseService`] - libsql connection management and schema creation
//! - [`SqliteHierarchyStore`] - closure-table implementation of the contract
//!
//! # Architecture
//!
//! Nodes live in a plain adjacency table (`nodes.parent_id`). A closure table
//! (`node_closure`) keeps one row per ancestor/descendant pair, which turns
//! ancestor walks and subtree fetches into single indexed queries and lets
//! the store re-check for cycles in the same transaction as a re-parent.

mod database;
mod error;
pub mod hierarchy_store;
mod sqlite_store;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use hierarchy_store::{HierarchyStore, StoreResult};
pub use sqlite_store::SqliteHierarchyStore;
