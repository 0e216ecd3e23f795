//! Clipboard Codec
//!
//! Copy produces a flat JSON array of `{id, name, description, parent}`
//! entries covering a node and its descendants. Paste accepts that format,
//! the older nested format (`{name, description, children: [...]}`) and any
//! mixture of the two, and normalizes everything into a [`PortableForest`]:
//! a pre-order list of id-free entries that point at their parent by index.
//! The store mints fresh ids when it inserts them.
//!
//! Decoding is lenient per entry and strict overall: entries without a
//! usable name are dropped one by one, but if nothing usable remains the
//! whole payload is rejected. Linking uses an explicit stack; copied chains
//! can be thousands of levels deep.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::models::{normalize_name, Node};
use crate::services::{ChildrenIndex, TreeError};

/// One id-free entry of a [`PortableForest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortableEntry {
    pub name: String,
    pub description: String,
    /// Index of the parent entry; `None` for a top-level entry
    pub parent: Option<usize>,
}

/// Id-free subtrees ready to be inserted anywhere
///
/// Entries are kept in pre-order. A parent index always points at an
/// earlier entry and every name is non-blank; [`PortableForest::push`] is
/// the only way in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortableForest {
    entries: Vec<PortableEntry>,
}

impl PortableForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry under `parent` (or at the top level) and return its index
    pub fn push(
        &mut self,
        parent: Option<usize>,
        name: &str,
        description: &str,
    ) -> Result<usize, TreeError> {
        let index = self.entries.len();
        if let Some(parent) = parent.filter(|&p| p >= index) {
            return Err(TreeError::invalid_paste_data(format!(
                "entry {} refers to parent entry {} which does not precede it",
                index, parent
            )));
        }
        let name = normalize_name(name)
            .map_err(|e| TreeError::invalid_paste_data(format!("entry {}: {}", index, e)))?;

        self.entries.push(PortableEntry {
            name,
            description: description.to_string(),
            parent,
        });
        Ok(index)
    }

    pub fn entries(&self) -> &[PortableEntry] {
        &self.entries
    }

    /// Number of entries, nested ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of top-level entries
    pub fn tree_count(&self) -> usize {
        self.entries.iter().filter(|e| e.parent.is_none()).count()
    }
}

/// Encode `root_id` and all of its descendants as pretty JSON
pub fn encode(nodes: &[Node], root_id: &str) -> Result<String, TreeError> {
    encode_with_index(nodes, &ChildrenIndex::build(nodes), root_id)
}

/// [`encode`] with an index already built for `nodes`
pub fn encode_with_index(
    nodes: &[Node],
    index: &ChildrenIndex,
    root_id: &str,
) -> Result<String, TreeError> {
    let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    if !by_id.contains_key(root_id) {
        return Err(TreeError::node_not_found(root_id));
    }

    let entries: Vec<&Node> = index
        .descendant_closure(root_id)
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).copied())
        .collect();

    Ok(serde_json::to_string_pretty(&entries)?)
}

/// A top-level entry after field validation, before flat linking
struct Candidate<'a> {
    key: Option<String>,
    parent_key: Option<String>,
    name: &'a str,
    description: &'a str,
    nested: &'a [Value],
}

/// Work left on the linking stack
enum Pending<'a> {
    Flat(usize),
    Nested(&'a Map<String, Value>),
}

/// Decode clipboard text into the entries to paste, in paste order
pub fn decode(json: &str) -> Result<PortableForest, TreeError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| TreeError::invalid_paste_data(format!("clipboard is not JSON ({})", e)))?;

    let entries = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => {
            return Err(TreeError::invalid_paste_data(
                "expected an object or an array of objects",
            ))
        }
    };

    let total = entries.len();
    let candidates: Vec<Candidate<'_>> = entries.iter().filter_map(parse_candidate).collect();
    if candidates.len() < total {
        tracing::debug!(
            "Dropped {} malformed clipboard entries",
            total - candidates.len()
        );
    }
    if candidates.is_empty() {
        return Err(TreeError::invalid_paste_data("no entry has a usable name"));
    }

    let forest = link_entries(&candidates);
    if forest.is_empty() {
        return Err(TreeError::invalid_paste_data(
            "every entry is part of a parent cycle",
        ));
    }
    Ok(forest)
}

fn parse_candidate(value: &Value) -> Option<Candidate<'_>> {
    let object = value.as_object()?;
    let (name, description) = name_and_description(object)?;
    Some(Candidate {
        key: key_field(object, "id"),
        parent_key: key_field(object, "parent"),
        name,
        description,
        nested: nested_children(object),
    })
}

/// Name (or legacy `label`) is required and must be non-blank
fn name_and_description(object: &Map<String, Value>) -> Option<(&str, &str)> {
    let name = object
        .get("name")
        .and_then(Value::as_str)
        .or_else(|| object.get("label").and_then(Value::as_str))
        .map(str::trim)
        .filter(|name| !name.is_empty())?;

    let description = object
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Some((name, description))
}

fn nested_children(object: &Map<String, Value>) -> &[Value] {
    object
        .get("children")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Ids may be strings or (in older exports) numbers
fn key_field(object: &Map<String, Value>, field: &str) -> Option<String> {
    match object.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Flatten candidates into a forest
///
/// A flat entry hangs under the entry its `parent` names; if that entry is
/// absent from the batch it becomes top-level. Entries caught in a parent
/// cycle are never reached from a top-level entry and are dropped. Nested
/// children come before flat children, and an invalid nested entry is
/// dropped together with its branch.
fn link_entries(candidates: &[Candidate<'_>]) -> PortableForest {
    let mut by_key: HashMap<&str, usize> = HashMap::new();
    for (i, candidate) in candidates.iter().enumerate() {
        if let Some(key) = candidate.key.as_deref() {
            by_key.entry(key).or_insert(i);
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); candidates.len()];
    let mut tops = Vec::new();
    for (i, candidate) in candidates.iter().enumerate() {
        let parent = candidate
            .parent_key
            .as_deref()
            .and_then(|key| by_key.get(key).copied())
            .filter(|&p| p != i);
        match parent {
            Some(p) => children[p].push(i),
            None => tops.push(i),
        }
    }

    let mut forest = PortableForest::new();
    let mut visited = vec![false; candidates.len()];
    let mut stack: Vec<(Pending<'_>, Option<usize>)> = tops
        .into_iter()
        .rev()
        .map(|i| (Pending::Flat(i), None))
        .collect();

    while let Some((pending, parent)) = stack.pop() {
        match pending {
            Pending::Flat(i) => {
                if std::mem::replace(&mut visited[i], true) {
                    continue;
                }
                let candidate = &candidates[i];
                let Ok(index) = forest.push(parent, candidate.name, candidate.description) else {
                    continue;
                };
                stack.extend(
                    children[i]
                        .iter()
                        .rev()
                        .map(|&child| (Pending::Flat(child), Some(index))),
                );
                push_nested(&mut stack, candidate.nested, index);
            }
            Pending::Nested(object) => {
                let Some((name, description)) = name_and_description(object) else {
                    continue;
                };
                let Ok(index) = forest.push(parent, name, description) else {
                    continue;
                };
                push_nested(&mut stack, nested_children(object), index);
            }
        }
    }

    forest
}

fn push_nested<'a>(
    stack: &mut Vec<(Pending<'a>, Option<usize>)>,
    items: &'a [Value],
    parent: usize,
) {
    stack.extend(
        items
            .iter()
            .rev()
            .filter_map(Value::as_object)
            .map(|object| (Pending::Nested(object), Some(parent))),
    );
}
