//! Domain Events for the Hierarchy Store
//!
//! The store broadcasts one event per successful mutation on a tokio
//! broadcast channel, so rendering or sync layers can react to changes
//! without polling. Rejected operations emit nothing.

use crate::models::Node;

/// Change notifications emitted by [`HierarchyStore`](super::HierarchyStore)
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEvent {
    /// The whole collection was replaced (new tree, import, restore)
    TreeReplaced { root_id: Option<String> },

    /// A node was added (add child or paste)
    NodeCreated(Node),

    /// Name or description changed
    NodeUpdated(Node),

    /// A node was reparented
    NodeMoved {
        id: String,
        old_parent: Option<String>,
        new_parent: String,
    },

    /// A node and its descendants were removed
    SubtreeDeleted { ids: Vec<String> },

    /// The collapsed set changed without touching the tree
    ViewChanged,
}

impl TreeEvent {
    /// Short event name, handy for log lines
    pub fn event_type(&self) -> &'static str {
        match self {
            TreeEvent::TreeReplaced { .. } => "tree:replaced",
            TreeEvent::NodeCreated(_) => "node:created",
            TreeEvent::NodeUpdated(_) => "node:updated",
            TreeEvent::NodeMoved { .. } => "node:moved",
            TreeEvent::SubtreeDeleted { .. } => "subtree:deleted",
            TreeEvent::ViewChanged => "view:changed",
        }
    }

    /// Whether the event changed tree content (as opposed to view state only)
    pub fn touches_tree(&self) -> bool {
        !matches!(self, TreeEvent::ViewChanged)
    }
}
