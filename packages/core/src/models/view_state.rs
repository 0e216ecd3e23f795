//! Collapsed/expanded view state
//!
//! Purely presentational: the set of node ids whose children are hidden.
//! It is kept beside the tree so it can be persisted and restored, but it
//! never influences the tree structure itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of collapsed node ids
///
/// Backed by a `BTreeSet` so the serialized form is stable between saves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollapsedSet {
    ids: BTreeSet<String>,
}

impl CollapsedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Hide the children of `id`; returns true if the state changed
    pub fn collapse(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    /// Show the children of `id`; returns true if the state changed
    pub fn expand(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// Flip one node; returns the new collapsed state
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expand(id) {
            false
        } else {
            self.collapse(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids for which `keep` returns false (used after deletions and loads)
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.ids.retain(|id| keep(id));
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl FromIterator<String> for CollapsedSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
