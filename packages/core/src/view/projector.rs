//! View Projector
//!
//! Turns the flat node collection plus the collapsed set into the ordered,
//! depth-annotated rows a list-style tree view renders. Pre-order
//! depth-first: each node is followed by its subtree unless it is collapsed.
//! Siblings keep collection order.
//!
//! The projection is a pure function of its inputs, so it is safe to
//! recompute on every render.

use std::collections::HashMap;

use crate::models::{CollapsedSet, Node};
use crate::services::ChildrenIndex;

/// One rendered line of the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRow<'a> {
    pub node: &'a Node,
    /// 0 for the root
    pub depth: usize,
    pub is_collapsed: bool,
    pub has_children: bool,
}

/// Project `nodes` into display rows
pub fn project<'a>(nodes: &'a [Node], collapsed: &CollapsedSet) -> Vec<ViewRow<'a>> {
    let index = ChildrenIndex::build(nodes);
    project_with_index(nodes, &index, collapsed)
}

/// Project using an index that was already built for `nodes`
pub fn project_with_index<'a>(
    nodes: &'a [Node],
    index: &ChildrenIndex,
    collapsed: &CollapsedSet,
) -> Vec<ViewRow<'a>> {
    let by_id: HashMap<&str, &'a Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let mut rows = Vec::with_capacity(nodes.len());

    // Explicit stack; pasted chains can be arbitrarily deep
    let mut stack: Vec<(&str, usize)> = index
        .roots()
        .iter()
        .rev()
        .map(|id| (id.as_str(), 0))
        .collect();

    while let Some((id, depth)) = stack.pop() {
        let Some(node) = by_id.get(id).copied() else {
            continue;
        };
        let children = index.children_of(id);
        let is_collapsed = collapsed.is_collapsed(id);

        rows.push(ViewRow {
            node,
            depth,
            is_collapsed,
            has_children: !children.is_empty(),
        });

        if !is_collapsed {
            stack.extend(children.iter().rev().map(|child| (child.as_str(), depth + 1)));
        }
    }

    rows
}
