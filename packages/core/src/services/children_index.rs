//! Children lookup index
//!
//! The tree is stored as a flat list of parent pointers. Walking downward
//! (descendant closure, projection) needs the inverse: parent id → ordered
//! child ids. This index is built once in O(n) and shared by the store's
//! subtree operations, the clipboard codec and the view projector instead of
//! re-filtering the flat list on every call.

use std::collections::{HashMap, HashSet};

use crate::models::Node;

/// Adjacency list over a flat node slice
///
/// Child lists keep collection order, which is the sibling order used for
/// display. Children whose parent id is not in the slice are listed under
/// that (missing) parent and are never reachable from a root.
#[derive(Debug, Clone, Default)]
pub struct ChildrenIndex {
    roots: Vec<String>,
    children: HashMap<String, Vec<String>>,
}

impl ChildrenIndex {
    pub fn build(nodes: &[Node]) -> Self {
        let mut index = Self::default();
        for node in nodes {
            match &node.parent {
                None => index.roots.push(node.id.clone()),
                Some(parent_id) => index
                    .children
                    .entry(parent_id.clone())
                    .or_default()
                    .push(node.id.clone()),
            }
        }
        index
    }

    /// Ids of nodes carrying the root marker, in collection order
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Direct children of `parent_id`, in collection order
    pub fn children_of(&self, parent_id: &str) -> &[String] {
        self.children
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_children(&self, id: &str) -> bool {
        !self.children_of(id).is_empty()
    }

    /// `id` followed by every transitive descendant, in pre-order
    ///
    /// Guards against revisiting ids so a corrupted (cyclic) input still
    /// terminates.
    pub fn descendant_closure(&self, id: &str) -> Vec<String> {
        let mut closure = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![id.to_string()];

        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            // Reverse push keeps the first child on top of the stack
            for child in self.children_of(&current).iter().rev() {
                stack.push(child.clone());
            }
            closure.push(current);
        }

        closure
    }
}
