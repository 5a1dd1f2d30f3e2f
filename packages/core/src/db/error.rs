//! Database Error Types
//!
//! This module defines error types for hierarchy store operations, covering
//! connection and initialization failures, SQL failures, and the constraint
//! rejections the store raises on its own (unknown rows, cycles).

use crate::models::NodeId;
use std::path::PathBuf;
use thiserror::Error;

/// Hierarchy store errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to initialize database schema
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// Row could not be decoded into a node
    #[error("Corrupt node row: {context}")]
    CorruptRow { context: String },

    /// Save or re-parent targeted a row that does not exist
    #[error("Node {id} is not persisted")]
    NotPersisted { id: NodeId },

    /// Re-parenting would make a node its own ancestor
    #[error("Refusing to re-parent node {node_id} under {new_parent_id}: it lies inside the node's subtree")]
    CycleRejected {
        node_id: NodeId,
        new_parent_id: NodeId,
    },
}

impl DatabaseError {
    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create an initialization failed error
    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    pub fn corrupt_row(context: impl Into<String>) -> Self {
        Self::CorruptRow {
            context: context.into(),
        }
    }

    pub fn not_persisted(id: NodeId) -> Self {
        Self::NotPersisted { id }
    }

    pub fn cycle_rejected(node_id: NodeId, new_parent_id: NodeId) -> Self {
        Self::CycleRejected {
            node_id,
            new_parent_id,
        }
    }
}
