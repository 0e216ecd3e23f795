//! Hierarchy Store Error Types
//!
//! Every rejection the store can produce during normal editing is a variant
//! here. None of them are fatal: the store guarantees the tree is untouched
//! whenever one is returned, and each message names the operation and the
//! reason so it can be shown to the user verbatim.

use crate::models::ValidationError;
use thiserror::Error;

/// Errors returned by tree operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A user-supplied field failed validation (blank name)
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Referenced node does not exist
    #[error("Node '{id}' does not exist")]
    NodeNotFound { id: String },

    /// The drop target is the dragged node's own descendant
    #[error("Cannot move '{node_id}' into its own descendant '{target_id}'")]
    Cycle { node_id: String, target_id: String },

    /// The root can be neither deleted nor moved
    #[error("Cannot {operation} the root node '{id}'")]
    ProtectedNode { id: String, operation: String },

    /// Clipboard payload had no usable entries or was not JSON
    #[error("Invalid paste data: {reason}")]
    InvalidPasteData { reason: String },

    /// Imported or restored tree failed shape or structure validation
    #[error("Invalid tree data: {reason}")]
    InvalidTreeData { reason: String },

    /// Encoding the tree to JSON failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TreeError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a cycle error for moving `node_id` under `target_id`
    pub fn cycle(node_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self::Cycle {
            node_id: node_id.into(),
            target_id: target_id.into(),
        }
    }

    /// Create a protected node error; `operation` is a verb like "delete"
    pub fn protected_node(id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::ProtectedNode {
            id: id.into(),
            operation: operation.into(),
        }
    }

    /// Create an invalid paste data error
    pub fn invalid_paste_data(reason: impl Into<String>) -> Self {
        Self::InvalidPasteData {
            reason: reason.into(),
        }
    }

    /// Create an invalid tree data error
    pub fn invalid_tree_data(reason: impl Into<String>) -> Self {
        Self::InvalidTreeData {
            reason: reason.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl From<serde_json::Error> for TreeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
