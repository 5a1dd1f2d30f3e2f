//! Service Layer Error Types
//!
//! Errors raised by [`crate::services::NodeService`]. Every variant carries
//! the offending id and the operation so the HTTP surface can build a precise
//! client-facing message without re-inspecting the request.

use crate::db::DatabaseError;
use crate::models::{NodeId, ValidationError};
use thiserror::Error;

/// Coarse classification used for status mapping and retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidOperation,
    ValidationFailed,
    Unavailable,
}

/// Service operation errors
///
/// All variants except `Unavailable` are caller errors and terminal for the
/// request. `Unavailable` wraps store transport failures and may be retried
/// by the caller.
#[derive(Error, Debug)]
pub enum NodeServiceError {
    /// Referenced node does not exist
    #[error("{role} not found: {id}")]
    NodeNotFound { id: NodeId, role: &'static str },

    /// The request is well-formed but violates a hierarchy rule
    #[error("Cannot {operation} node {node_id}: {reason}")]
    InvalidOperation {
        operation: &'static str,
        node_id: NodeId,
        reason: String,
    },

    /// Input rejected before reaching the engine
    #[error("Node validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Store transport or SQL failure
    #[error("Hierarchy store unavailable during {operation}: {source}")]
    Unavailable {
        operation: &'static str,
        #[source]
        source: DatabaseError,
    },
}

impl NodeServiceError {
    /// Create a node not found error
    pub fn node_not_found(id: NodeId) -> Self {
        Self::NodeNotFound { id, role: "Node" }
    }

    /// Create a not found error for a referenced parent
    pub fn parent_not_found(id: NodeId) -> Self {
        Self::NodeNotFound {
            id,
            role: "Parent node",
        }
    }

    /// Create a not found error for a re-parenting target
    pub fn new_parent_not_found(id: NodeId) -> Self {
        Self::NodeNotFound {
            id,
            role: "New parent node",
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(
        operation: &'static str,
        node_id: NodeId,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOperation {
            operation,
            node_id,
            reason: reason.into(),
        }
    }

    /// Translate a store error raised while performing `operation`
    ///
    /// The store's own constraint rejections keep their meaning: a cycle it
    /// refuses is an invalid operation, a row it cannot find is not found.
    pub fn from_store(operation: &'static str, err: DatabaseError) -> Self {
        match err {
            DatabaseError::CycleRejected {
                node_id,
                new_parent_id,
            } => Self::invalid_operation(
                operation,
                node_id,
                format!("node {} is inside its subtree", new_parent_id),
            ),
            DatabaseError::NotPersisted { id } => Self::node_not_found(id),
            source => Self::Unavailable { operation, source },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NodeNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            Self::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
        }
    }

    /// Only transport failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Unavailable
    }
}
