//! Hierarchy Store
//!
//! The single owner of the concept tree. It holds the flat node collection
//! together with the collapsed view state and performs every mutation that
//! has to preserve the tree invariants:
//!
//! - exactly one node carries the root marker (`parent == None`)
//! - every other node's parent exists in the collection
//! - following parents upward never revisits a node
//!
//! Every operation runs to completion synchronously. An operation either
//! succeeds in full or returns a [`TreeError`] before anything is touched,
//! so callers never observe a partially applied change. Successful
//! mutations bump [`HierarchyStore::revision`] and broadcast a
//! [`TreeEvent`].
//!
//! # Examples
//!
//! ```rust
//! use concept_tree_core::services::{HierarchyStore, TreeError};
//!
//! let mut store = HierarchyStore::new();
//! let root = store.create_root("Root", "");
//! let a = store.add_child(&root.id, "A", "").unwrap();
//! let b = store.add_child(&a.id, "B", "").unwrap();
//!
//! // A node can never be dropped onto its own descendant
//! assert!(matches!(store.reparent(&a.id, &b.id), Err(TreeError::Cycle { .. })));
//!
//! // Deleting A takes B with it
//! store.delete_subtree(&a.id).unwrap();
//! assert_eq!(store.len(), 1);
//! ```

use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};

use tokio::sync::broadcast;

use crate::codec::clipboard::{self, PortableForest};
use crate::identity::{generate_node_id, is_valid_node_id};
use crate::models::{normalize_name, CollapsedSet, Node};
use crate::services::children_index::ChildrenIndex;
use crate::services::error::TreeError;
use crate::services::events::TreeEvent;
use crate::view::{self, ViewRow};

/// Capacity of the event channel; slow subscribers see `Lagged` beyond this
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Result of a successful [`HierarchyStore::reparent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparentOutcome {
    /// The node now hangs under the drop target
    Moved,
    /// Self-drop, or the node already was a child of the drop target
    Unchanged,
}

/// Owner of the flat node collection and its view state
#[derive(Debug)]
pub struct HierarchyStore {
    nodes: Vec<Node>,
    positions: HashMap<String, usize>,
    collapsed: CollapsedSet,
    /// Rebuilt lazily after each mutation
    index: OnceCell<ChildrenIndex>,
    revision: u64,
    event_tx: broadcast::Sender<TreeEvent>,
}

impl Default for HierarchyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyStore {
    /// Create an empty store (no root yet)
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            nodes: Vec::new(),
            positions: HashMap::new(),
            collapsed: CollapsedSet::new(),
            index: OnceCell::new(),
            revision: 0,
            event_tx,
        }
    }

    /// Create a store holding a single fresh root
    pub fn with_root(name: &str, description: &str) -> Self {
        let mut store = Self::new();
        store.create_root(name, description);
        store
    }

    /// Build a store from externally supplied nodes
    ///
    /// The nodes must form a valid tree (see [`validate_structure`]);
    /// otherwise [`TreeError::InvalidTreeData`] is returned.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, TreeError> {
        validate_structure(&nodes)?;
        let mut store = Self::new();
        store.nodes = nodes;
        store.rebuild_positions();
        Ok(store)
    }

    /// Subscribe to change notifications
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<TreeEvent> {
        self.event_tx.subscribe()
    }

    /// Ignores send errors: having no subscribers is normal
    fn emit_event(&self, event: TreeEvent) {
        tracing::trace!("Emitting {}", event.event_type());
        let _ = self.event_tx.send(event);
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.index = OnceCell::new();
    }

    fn rebuild_positions(&mut self) {
        self.positions = self
            .nodes
            .iter()
            .enumerate()
            .map(|(pos, node)| (node.id.clone(), pos))
            .collect();
        self.index = OnceCell::new();
    }

    fn position(&self, id: &str) -> Result<usize, TreeError> {
        self.positions
            .get(id)
            .copied()
            .ok_or_else(|| TreeError::node_not_found(id))
    }

    // Queries

    /// Shared children lookup, built on first use after a mutation
    pub fn index(&self) -> &ChildrenIndex {
        self.index.get_or_init(|| ChildrenIndex::build(&self.nodes))
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.positions.get(id).map(|&pos| &self.nodes[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn root(&self) -> Option<&Node> {
        self.index().roots().first().and_then(|id| self.get(id))
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root().map(|node| node.id.as_str())
    }

    /// All nodes in collection order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Monotonic counter bumped by every successful mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn collapsed(&self) -> &CollapsedSet {
        &self.collapsed
    }

    /// Direct children of `id` in sibling order
    pub fn children(&self, id: &str) -> Vec<&Node> {
        self.index()
            .children_of(id)
            .iter()
            .filter_map(|child_id| self.get(child_id))
            .collect()
    }

    /// Path from the root down to `id`, both inclusive
    pub fn ancestors(&self, id: &str) -> Result<Vec<&Node>, TreeError> {
        let mut path = Vec::new();
        let mut current = Some(self.position(id)?);

        while let Some(pos) = current {
            let node = &self.nodes[pos];
            path.push(node);
            if path.len() > self.nodes.len() {
                return Err(TreeError::invalid_tree_data(format!(
                    "parent chain of '{}' loops",
                    id
                )));
            }
            current = node
                .parent
                .as_deref()
                .and_then(|parent_id| self.positions.get(parent_id).copied());
        }

        path.reverse();
        Ok(path)
    }

    /// Whether `candidate_id` is `ancestor_id` or lies beneath it
    ///
    /// Walks the candidate's parent chain upward, O(depth).
    pub fn is_descendant(&self, ancestor_id: &str, candidate_id: &str) -> bool {
        let mut current = Some(candidate_id);
        let mut steps = 0;

        while let Some(id) = current {
            if id == ancestor_id {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                break;
            }
            current = self.get(id).and_then(|node| node.parent.as_deref());
        }

        false
    }

    /// `id` and all of its descendants in pre-order; empty if `id` is unknown
    pub fn descendant_ids(&self, id: &str) -> Vec<String> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.index().descendant_closure(id)
    }

    /// Re-check every structural invariant
    pub fn check_invariants(&self) -> Result<(), TreeError> {
        validate_structure(&self.nodes)
    }

    // Mutations

    /// Discard everything and start over with a single root
    ///
    /// Never fails; a blank name becomes the default root name. The collapsed
    /// set is cleared since none of its ids survive.
    pub fn create_root(&mut self, name: &str, description: &str) -> Node {
        let root = Node::new_root(name, description);
        self.nodes = vec![root.clone()];
        self.collapsed.clear();
        self.rebuild_positions();
        self.touch();

        tracing::info!("Created new tree with root '{}' ({})", root.name, root.id);
        self.emit_event(TreeEvent::TreeReplaced {
            root_id: Some(root.id.clone()),
        });
        root
    }

    /// Append a new child under `parent_id` and expand the parent
    pub fn add_child(
        &mut self,
        parent_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Node, TreeError> {
        self.position(parent_id)?;
        let node = Node::new_child(parent_id, name, description).inspect_err(|e| {
            tracing::warn!("Rejected add under '{}': {}", parent_id, e);
        })?;

        self.positions.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node.clone());
        self.collapsed.expand(parent_id);
        self.touch();

        tracing::debug!("Added '{}' ({}) under {}", node.name, node.id, parent_id);
        self.emit_event(TreeEvent::NodeCreated(node.clone()));
        Ok(node)
    }

    /// Update name and description in place; id and parent are unchanged
    pub fn rename_and_describe(
        &mut self,
        node_id: &str,
        name: &str,
        description: &str,
    ) -> Result<(), TreeError> {
        let pos = self.position(node_id)?;
        let name = normalize_name(name).inspect_err(|e| {
            tracing::warn!("Rejected rename of '{}': {}", node_id, e);
        })?;

        let node = &mut self.nodes[pos];
        node.name = name;
        node.description = description.to_string();
        let updated = node.clone();
        self.touch();

        tracing::debug!("Updated node {}", node_id);
        self.emit_event(TreeEvent::NodeUpdated(updated));
        Ok(())
    }

    /// Move `drag_id` under `drop_target_id`
    ///
    /// Evaluation order:
    /// 1. self-drop is a silent no-op
    /// 2. both nodes must exist
    /// 3. the drop target must not be the dragged node or lie beneath it
    /// 4. the root never moves
    ///
    /// On success only the dragged node's `parent` changes (its position in
    /// the collection is kept) and the drop target is expanded.
    pub fn reparent(
        &mut self,
        drag_id: &str,
        drop_target_id: &str,
    ) -> Result<ReparentOutcome, TreeError> {
        if drag_id == drop_target_id {
            tracing::debug!("Ignoring self-drop of {}", drag_id);
            return Ok(ReparentOutcome::Unchanged);
        }

        let drag_pos = self.position(drag_id)?;
        self.position(drop_target_id)?;

        if self.is_descendant(drag_id, drop_target_id) {
            tracing::warn!(
                "Rejected move of {} under its descendant {}",
                drag_id,
                drop_target_id
            );
            return Err(TreeError::cycle(drag_id, drop_target_id));
        }

        if self.nodes[drag_pos].is_root() {
            return Err(TreeError::protected_node(drag_id, "move"));
        }

        if self.nodes[drag_pos].parent.as_deref() == Some(drop_target_id) {
            if self.collapsed.expand(drop_target_id) {
                self.emit_event(TreeEvent::ViewChanged);
            }
            return Ok(ReparentOutcome::Unchanged);
        }

        let old_parent = self.nodes[drag_pos]
            .parent
            .replace(drop_target_id.to_string());
        self.collapsed.expand(drop_target_id);
        self.touch();

        tracing::debug!(
            "Moved {} from {:?} to {}",
            drag_id,
            old_parent,
            drop_target_id
        );
        self.emit_event(TreeEvent::NodeMoved {
            id: drag_id.to_string(),
            old_parent,
            new_parent: drop_target_id.to_string(),
        });
        Ok(ReparentOutcome::Moved)
    }

    /// Remove `node_id` and every descendant in one step
    ///
    /// Returns the removed ids in pre-order. Unknown ids are a no-op and
    /// return an empty list; the root is protected.
    pub fn delete_subtree(&mut self, node_id: &str) -> Result<Vec<String>, TreeError> {
        let Some(node) = self.get(node_id) else {
            tracing::debug!("Delete of unknown node {} ignored", node_id);
            return Ok(Vec::new());
        };
        if node.is_root() {
            tracing::warn!("Rejected delete of root {}", node_id);
            return Err(TreeError::protected_node(node_id, "delete"));
        }

        let removed = self.index().descendant_closure(node_id);
        let doomed: HashSet<&str> = removed.iter().map(String::as_str).collect();

        self.nodes.retain(|n| !doomed.contains(n.id.as_str()));
        self.collapsed.retain(|id| !doomed.contains(id));
        self.rebuild_positions();
        self.touch();

        tracing::debug!("Deleted subtree {} ({} nodes)", node_id, removed.len());
        self.emit_event(TreeEvent::SubtreeDeleted {
            ids: removed.clone(),
        });
        Ok(removed)
    }

    /// Portable JSON for `node_id` and its descendants (non-destructive)
    pub fn copy_subtree(&self, node_id: &str) -> Result<String, TreeError> {
        clipboard::encode_with_index(&self.nodes, self.index(), node_id)
    }

    /// Insert a copied subtree under `parent_id` with fresh ids
    ///
    /// The payload is fully decoded before anything is inserted; if no
    /// usable entry remains the paste is rejected and the tree is untouched.
    pub fn paste_as_child(&mut self, parent_id: &str, json: &str) -> Result<Vec<Node>, TreeError> {
        self.position(parent_id)?;
        let forest = clipboard::decode(json).inspect_err(|e| {
            tracing::warn!("Rejected paste under {}: {}", parent_id, e);
        })?;
        Ok(self.insert_forest(parent_id, &forest))
    }

    /// Insert an already decoded forest under `parent_id` with fresh ids
    pub fn paste_forest(
        &mut self,
        parent_id: &str,
        forest: &PortableForest,
    ) -> Result<Vec<Node>, TreeError> {
        self.position(parent_id)?;
        if forest.is_empty() {
            return Err(TreeError::invalid_paste_data("nothing to paste"));
        }
        Ok(self.insert_forest(parent_id, forest))
    }

    fn insert_forest(&mut self, parent_id: &str, forest: &PortableForest) -> Vec<Node> {
        let created = materialize(forest, parent_id);

        for node in &created {
            self.positions.insert(node.id.clone(), self.nodes.len());
            self.nodes.push(node.clone());
        }
        self.collapsed.expand(parent_id);
        self.touch();

        tracing::debug!("Pasted {} nodes under {}", created.len(), parent_id);
        for node in &created {
            self.emit_event(TreeEvent::NodeCreated(node.clone()));
        }
        created
    }

    /// Replace the whole collection with validated external nodes
    ///
    /// Collapsed ids that no longer exist are dropped.
    pub fn replace_all(&mut self, nodes: Vec<Node>) -> Result<(), TreeError> {
        validate_structure(&nodes)?;
        if nodes.is_empty() {
            return Err(TreeError::invalid_tree_data("tree has no root"));
        }

        self.nodes = nodes;
        self.rebuild_positions();
        let positions = &self.positions;
        self.collapsed.retain(|id| positions.contains_key(id));
        self.touch();

        let root_id = self.root_id().map(str::to_string);
        tracing::info!("Replaced tree ({} nodes)", self.nodes.len());
        self.emit_event(TreeEvent::TreeReplaced { root_id });
        Ok(())
    }

    // View state

    /// Flip the collapsed state of one node; returns the new state
    ///
    /// Only the toggled node changes. Descendants keep their own state.
    pub fn toggle_collapsed(&mut self, id: &str) -> Result<bool, TreeError> {
        self.position(id)?;
        let collapsed = self.collapsed.toggle(id);
        self.emit_event(TreeEvent::ViewChanged);
        Ok(collapsed)
    }

    pub fn collapse(&mut self, id: &str) -> Result<(), TreeError> {
        self.position(id)?;
        if self.collapsed.collapse(id) {
            self.emit_event(TreeEvent::ViewChanged);
        }
        Ok(())
    }

    pub fn expand(&mut self, id: &str) -> Result<(), TreeError> {
        self.position(id)?;
        if self.collapsed.expand(id) {
            self.emit_event(TreeEvent::ViewChanged);
        }
        Ok(())
    }

    /// Expand every node
    pub fn expand_all(&mut self) {
        if !self.collapsed.is_empty() {
            self.collapsed.clear();
            self.emit_event(TreeEvent::ViewChanged);
        }
    }

    /// Collapse every node that has children
    pub fn collapse_all(&mut self) {
        let parents: Vec<String> = self
            .nodes
            .iter()
            .filter(|node| self.index().has_children(&node.id))
            .map(|node| node.id.clone())
            .collect();
        let mut changed = false;
        for id in &parents {
            changed |= self.collapsed.collapse(id);
        }
        if changed {
            self.emit_event(TreeEvent::ViewChanged);
        }
    }

    /// Restore a persisted collapsed set, ignoring ids not in the tree
    pub fn restore_collapsed(&mut self, mut collapsed: CollapsedSet) {
        collapsed.retain(|id| self.positions.contains_key(id));
        self.collapsed = collapsed;
        self.emit_event(TreeEvent::ViewChanged);
    }

    /// Display rows for the current tree and collapsed set
    pub fn project(&self) -> Vec<ViewRow<'_>> {
        view::project_with_index(&self.nodes, self.index(), &self.collapsed)
    }
}

/// Turn a portable forest into fresh nodes, keeping its pre-order
fn materialize(forest: &PortableForest, parent_id: &str) -> Vec<Node> {
    let mut created: Vec<Node> = Vec::with_capacity(forest.len());
    for entry in forest.entries() {
        // Parent indices always point at an earlier entry
        let parent = match entry.parent {
            Some(index) => created[index].id.clone(),
            None => parent_id.to_string(),
        };
        created.push(Node {
            id: generate_node_id(),
            name: entry.name.clone(),
            description: entry.description.clone(),
            parent: Some(parent),
        });
    }
    created
}

/// Check that `nodes` form a valid tree
///
/// Rules: ids valid and unique, names non-blank, exactly one root, every
/// parent present, every node reachable from the root (which, given the
/// other rules, means acyclic). An empty slice is the valid empty state.
pub fn validate_structure(nodes: &[Node]) -> Result<(), TreeError> {
    if nodes.is_empty() {
        return Ok(());
    }

    let mut ids = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !is_valid_node_id(&node.id) {
            return Err(TreeError::invalid_tree_data(format!(
                "invalid node id '{}'",
                node.id
            )));
        }
        if !ids.insert(node.id.as_str()) {
            return Err(TreeError::invalid_tree_data(format!(
                "duplicate node id '{}'",
                node.id
            )));
        }
        if node.name.trim().is_empty() {
            return Err(TreeError::invalid_tree_data(format!(
                "node '{}' has an empty name",
                node.id
            )));
        }
    }

    let roots: Vec<&Node> = nodes.iter().filter(|n| n.is_root()).collect();
    let root = match roots.as_slice() {
        [root] => *root,
        [] => return Err(TreeError::invalid_tree_data("tree has no root")),
        _ => {
            return Err(TreeError::invalid_tree_data(format!(
                "tree has {} roots, expected exactly one",
                roots.len()
            )))
        }
    };

    if let Some(orphan) = nodes
        .iter()
        .find(|n| matches!(&n.parent, Some(p) if !ids.contains(p.as_str())))
    {
        return Err(TreeError::invalid_tree_data(format!(
            "node '{}' references missing parent '{}'",
            orphan.id,
            orphan.parent.as_deref().unwrap_or_default()
        )));
    }

    let reachable = ChildrenIndex::build(nodes).descendant_closure(&root.id);
    if reachable.len() != nodes.len() {
        return Err(TreeError::invalid_tree_data(format!(
            "{} nodes are part of a parent cycle",
            nodes.len() - reachable.len()
        )));
    }

    Ok(())
}
