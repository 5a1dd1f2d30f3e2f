//! OrgTree Core
//!
//! This crate maintains an organization hierarchy (organizations, locations,
//! departments, employees) as a mutable tree: durable in an embedded libsql
//! database, queryable as a nested forest, and cached for read-heavy access.
//!
//! # Architecture
//!
//! - **Closure table**: ancestry is indexed so ancestor walks and subtree
//!   fetches are single queries
//! - **Color inheritance**: LOCATION/DEPARTMENT nodes own a pool color, all
//!   other nodes inherit from their nearest such ancestor
//! - **Cache-aside forest**: the full listing is memoized and dropped on every
//!   mutation
//!
//! # Modules
//!
//! - [`models`] - Data structures and request validation
//! - [`db`] - Hierarchy store contract and libsql implementation
//! - [`cache`] - Key/value cache contract and in-memory backend
//! - [`services`] - Tree mutation engine, color pool, forest cache

pub mod cache;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
