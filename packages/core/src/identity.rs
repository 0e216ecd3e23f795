//! Node Identity
//!
//! Node ids are opaque strings. Freshly minted ids are UUID v4 values, which
//! keeps them unique across trees so a pasted subtree can never collide with
//! the ids it was copied from. Ids that arrive through import are accepted
//! as-is as long as they are non-blank.

use uuid::Uuid;

/// Generate a new, globally unique node id
///
/// # Examples
///
/// ```rust
/// use concept_tree_core::identity::generate_node_id;
///
/// let a = generate_node_id();
/// let b = generate_node_id();
/// assert_ne!(a, b);
/// ```
pub fn generate_node_id() -> String {
    Uuid::new_v4().to_string()
}

/// Check whether a string is usable as a node id
///
/// Any non-blank string without surrounding whitespace is accepted, so
/// externally authored trees with short ids like `"root"` still import.
pub fn is_valid_node_id(id: &str) -> bool {
    !id.is_empty() && id.trim() == id
}

/// Check whether an id was minted by [`generate_node_id`]
pub fn is_generated_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_node_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_generated_ids_are_valid() {
        let id = generate_node_id();
        assert!(is_valid_node_id(&id));
        assert!(is_generated_id(&id));
    }

    #[test]
    fn test_is_valid_node_id() {
        assert!(is_valid_node_id("root"));
        assert!(is_valid_node_id("node-123"));
        assert!(!is_valid_node_id(""));
        assert!(!is_valid_node_id("  "));
        assert!(!is_valid_node_id(" padded "));
    }

    #[test]
    fn test_is_generated_id() {
        assert!(!is_generated_id("root"));
        assert!(is_generated_id("550e8400-e29b-41d4-a716-446655440000"));
    }
}
