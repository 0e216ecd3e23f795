//! Tree File Import/Export
//!
//! The file format is the live model itself: a JSON array of
//! `{id, name, description, parent}` objects. Import is all-or-nothing,
//! unlike paste which filters entries one by one.

use serde_json::{Map, Value};

use crate::models::Node;
use crate::services::{validate_structure, ChildrenIndex, TreeError};
use crate::utils::strip_markdown;

/// Serialize the whole collection as pretty JSON
pub fn export_tree(nodes: &[Node]) -> Result<String, TreeError> {
    Ok(serde_json::to_string_pretty(nodes)?)
}

/// Parse and validate an exported tree
///
/// Every entry must be an object with string `id`, `name` and
/// `description`, and a `parent` that is null or a string. A single bad
/// entry rejects the whole batch, and the accepted batch must form a
/// valid, non-empty tree.
pub fn import_tree(json: &str) -> Result<Vec<Node>, TreeError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| TreeError::invalid_tree_data(format!("file is not JSON ({})", e)))?;

    let Value::Array(entries) = value else {
        return Err(TreeError::invalid_tree_data(
            "top level must be an array of nodes",
        ));
    };
    if entries.is_empty() {
        return Err(TreeError::invalid_tree_data("file contains no nodes"));
    }

    let nodes = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_entry(entry).map_err(|reason| {
            TreeError::invalid_tree_data(format!("entry {}: {}", i, reason))
        }))
        .collect::<Result<Vec<_>, _>>()?;

    validate_structure(&nodes)?;
    tracing::debug!("Imported {} nodes", nodes.len());
    Ok(nodes)
}

fn parse_entry(entry: &Value) -> Result<Node, String> {
    let object = entry
        .as_object()
        .ok_or_else(|| "expected an object".to_string())?;

    let id = string_field(object, "id")?;
    let name = string_field(object, "name")?.trim().to_string();
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    let description = string_field(object, "description")?;
    let parent = match object.get("parent") {
        Some(Value::Null) => None,
        Some(Value::String(parent)) => Some(parent.clone()),
        Some(_) => return Err("parent must be null or a string".to_string()),
        None => return Err("missing field 'parent'".to_string()),
    };

    Ok(Node {
        id,
        name,
        description,
        parent,
    })
}

fn string_field(object: &Map<String, Value>, field: &str) -> Result<String, String> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(format!("field '{}' must be a string", field)),
        None => Err(format!("missing field '{}'", field)),
    }
}

/// Render the tree as a nested Markdown bullet list
///
/// One line per node, `- **name**: description`, indented two spaces per
/// level. Descriptions are flattened to a single plain-text line; nodes
/// without a description get just the bold name.
pub fn export_markdown_outline(nodes: &[Node]) -> String {
    let index = ChildrenIndex::build(nodes);
    let by_id: std::collections::HashMap<&str, &Node> =
        nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut out = String::new();
    let mut stack: Vec<(&str, usize)> = index
        .roots()
        .iter()
        .rev()
        .map(|id| (id.as_str(), 0))
        .collect();

    while let Some((id, depth)) = stack.pop() {
        let Some(node) = by_id.get(id) else {
            continue;
        };

        out.push_str(&"  ".repeat(depth));
        out.push_str("- **");
        out.push_str(&node.name);
        out.push_str("**");
        let description = strip_markdown(&node.description);
        if !description.is_empty() {
            out.push_str(": ");
            out.push_str(&description);
        }
        out.push('\n');

        stack.extend(
            index
                .children_of(id)
                .iter()
                .rev()
                .map(|child| (child.as_str(), depth + 1)),
        );
    }

    out
}
