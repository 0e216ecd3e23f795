//! Backup Snapshot Document
//!
//! A single opaque JSON document carrying the whole tree plus the prompt
//! library, suitable for pushing to a remote backup. Transport is the
//! caller's concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Node, PromptLibrary};
use crate::services::{validate_structure, TreeError};

/// Current snapshot layout version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub prompts: PromptLibrary,
}

impl BackupSnapshot {
    /// Capture the given tree and prompts, stamped with the current time
    pub fn capture(nodes: &[Node], prompts: &PromptLibrary) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            exported_at: Utc::now(),
            nodes: nodes.to_vec(),
            prompts: prompts.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, TreeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot and validate its tree
    ///
    /// Unknown format versions, an empty tree, or a tree that breaks the
    /// structural rules are rejected as [`TreeError::InvalidTreeData`].
    pub fn from_json(json: &str) -> Result<Self, TreeError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| TreeError::invalid_tree_data(format!("malformed snapshot ({})", e)))?;

        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(TreeError::invalid_tree_data(format!(
                "unsupported snapshot format version {}",
                snapshot.format_version
            )));
        }
        if snapshot.nodes.is_empty() {
            return Err(TreeError::invalid_tree_data("snapshot contains no nodes"));
        }
        validate_structure(&snapshot.nodes)?;

        Ok(snapshot)
    }
}
