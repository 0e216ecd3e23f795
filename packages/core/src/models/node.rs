//! Node Data Structures
//!
//! A concept tree is a flat collection of [`Node`] values linked by parent
//! pointers. The root is the single node whose `parent` is `None`; every
//! other node names exactly one parent that lives in the same collection.
//!
//! # Examples
//!
//! ```rust
//! use concept_tree_core::models::Node;
//!
//! let root = Node::new_root("Physics", "");
//! let child = Node::new_child(&root.id, "Mechanics", "Forces and motion").unwrap();
//!
//! assert!(root.is_root());
//! assert_eq!(child.parent.as_deref(), Some(root.id.as_str()));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::generate_node_id;
use crate::utils;

/// Name given to a root created without a usable name
pub const DEFAULT_ROOT_NAME: &str = "Root";

/// Validation errors for user-supplied fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Prompt title cannot be empty")]
    EmptyTitle,
}

/// One concept in the hierarchy.
///
/// Field order is the serialized order, so exported JSON always reads
/// `id`, `name`, `description`, `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Opaque unique identifier, immutable after creation
    pub id: String,

    /// Human-readable name, never empty after trimming
    pub name: String,

    /// Free text, may be empty, may contain lightweight markup
    #[serde(default)]
    pub description: String,

    /// Parent id, or `None` for the root
    pub parent: Option<String>,
}

impl Node {
    /// Create a root node with a fresh id
    ///
    /// A blank name falls back to [`DEFAULT_ROOT_NAME`] so root creation
    /// never fails.
    pub fn new_root(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = normalize_name(&name.into()).unwrap_or_else(|_| DEFAULT_ROOT_NAME.to_string());
        Self {
            id: generate_node_id(),
            name,
            description: description.into(),
            parent: None,
        }
    }

    /// Create a child node with a fresh id under `parent_id`
    pub fn new_child(
        parent_id: &str,
        name: &str,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: generate_node_id(),
            name: normalize_name(name)?,
            description: description.into(),
            parent: Some(parent_id.to_string()),
        })
    }

    /// Whether this node carries the root marker
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Single-line plain text preview of the description
    pub fn description_preview(&self, max_chars: usize) -> String {
        utils::preview(&self.description, max_chars)
    }
}

/// Trim a user-supplied name, rejecting names that are blank
pub fn normalize_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}
