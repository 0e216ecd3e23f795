//! Hierarchy Store Scenario Tests
//!
//! End-to-end editing scenarios against the public store API: building a
//! tree, rejected moves and deletes, validation, and copy/paste.

#[cfg(test)]
mod hierarchy_scenarios {
    use anyhow::Result;
    use concept_tree_core::codec::{clipboard, PortableForest};
    use concept_tree_core::services::{HierarchyStore, ReparentOutcome, TreeError};

    fn names_and_depths(store: &HierarchyStore) -> Vec<(String, usize)> {
        store
            .project()
            .iter()
            .map(|row| (row.node.name.clone(), row.depth))
            .collect()
    }

    #[test]
    fn test_siblings_project_in_insertion_order() -> Result<()> {
        let mut store = HierarchyStore::new();
        let root = store.create_root("Root", "");
        store.add_child(&root.id, "A", "")?;
        store.add_child(&root.id, "B", "")?;

        assert_eq!(
            names_and_depths(&store),
            vec![
                ("Root".to_string(), 0),
                ("A".to_string(), 1),
                ("B".to_string(), 1),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_root_cannot_move_under_its_descendant() -> Result<()> {
        let mut store = HierarchyStore::new();
        let root = store.create_root("Root", "");
        let a = store.add_child(&root.id, "A", "")?;
        let b = store.add_child(&a.id, "B", "")?;
        let before = store.nodes().to_vec();

        let err = store.reparent(&root.id, &b.id).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
        assert_eq!(store.nodes(), before.as_slice());
        Ok(())
    }

    #[test]
    fn test_delete_removes_whole_subtree() -> Result<()> {
        let mut store = HierarchyStore::new();
        let root = store.create_root("Root", "");
        let a = store.add_child(&root.id, "A", "")?;
        let b = store.add_child(&a.id, "B", "")?;
        let c = store.add_child(&a.id, "C", "")?;

        let removed = store.delete_subtree(&a.id)?;
        assert_eq!(removed, vec![a.id, b.id, c.id]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.root_id(), Some(root.id.as_str()));
        Ok(())
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let mut store = HierarchyStore::with_root("Root", "");
        let root_id = store.root_id().unwrap().to_string();

        let err = store.add_child(&root_id, "", "desc").unwrap_err();
        assert!(matches!(err, TreeError::Validation(_)));
        assert_eq!(err.to_string(), "Name cannot be empty");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_copy_paste_preserves_structure_with_fresh_ids() -> Result<()> {
        let mut store = HierarchyStore::new();
        let root = store.create_root("Root", "");
        let a = store.add_child(&root.id, "A", "alpha")?;
        let b = store.add_child(&a.id, "B", "")?;
        let c = store.add_child(&a.id, "C", "")?;

        let encoded = clipboard::encode(store.nodes(), &a.id)?;
        let pasted = store.paste_as_child(&root.id, &encoded)?;

        assert_eq!(pasted.len(), 3);
        let source_ids = [&a.id, &b.id, &c.id];
        for node in &pasted {
            assert!(!source_ids.contains(&&node.id));
        }

        let new_a = &pasted[0];
        assert_eq!(new_a.name, "A");
        assert_eq!(new_a.description, "alpha");
        assert_eq!(new_a.parent.as_deref(), Some(root.id.as_str()));

        let children: Vec<&str> = store
            .children(&new_a.id)
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(children, ["B", "C"]);
        store.check_invariants()?;
        Ok(())
    }

    #[test]
    fn test_root_delete_always_rejected() -> Result<()> {
        let mut store = HierarchyStore::with_root("Root", "");
        let root_id = store.root_id().unwrap().to_string();

        let err = store.delete_subtree(&root_id).unwrap_err();
        assert!(matches!(err, TreeError::ProtectedNode { .. }));

        store.add_child(&root_id, "Child", "")?;
        let err = store.delete_subtree(&root_id).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Cannot delete the root node '{}'", root_id)
        );
        assert_eq!(store.len(), 2);
        Ok(())
    }

    #[test]
    fn test_collapse_hides_children_until_drop_expands() -> Result<()> {
        let mut store = HierarchyStore::with_root("Root", "");
        let root_id = store.root_id().unwrap().to_string();
        let a = store.add_child(&root_id, "A", "")?;
        let b = store.add_child(&root_id, "B", "")?;
        store.add_child(&a.id, "A1", "")?;

        assert!(store.toggle_collapsed(&a.id)?);
        assert_eq!(store.project().len(), 3);

        assert_eq!(store.reparent(&b.id, &a.id)?, ReparentOutcome::Moved);
        let names: Vec<String> = names_and_depths(&store)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        // B keeps its collection position, which precedes A1
        assert_eq!(names, ["Root", "A", "B", "A1"]);
        Ok(())
    }

    #[test]
    fn test_legacy_nested_paste() -> Result<()> {
        let mut store = HierarchyStore::with_root("Root", "");
        let root_id = store.root_id().unwrap().to_string();

        let legacy = r#"[
            {"label": "Ecology", "children": [
                {"name": "Food webs", "description": "Who eats whom"}
            ]},
            {"name": "   "}
        ]"#;
        let pasted = store.paste_as_child(&root_id, legacy)?;

        assert_eq!(pasted.len(), 2);
        assert_eq!(pasted[1].parent.as_deref(), Some(pasted[0].id.as_str()));
        assert_eq!(pasted[1].description, "Who eats whom");
        Ok(())
    }

    #[test]
    fn test_deep_chain_survives_copy_and_paste() -> Result<()> {
        let depth = 5_000;
        let mut store = HierarchyStore::with_root("Root", "");
        let root_id = store.root_id().unwrap().to_string();

        let mut chain = Vec::with_capacity(depth);
        let mut parent = root_id.clone();
        for level in 0..depth {
            let node = store.add_child(&parent, &format!("Level {}", level), "")?;
            parent = node.id.clone();
            chain.push(node.id);
        }

        let copied = store.copy_subtree(&chain[0])?;
        let pasted = store.paste_as_child(&root_id, &copied)?;

        assert_eq!(pasted.len(), depth);
        assert_eq!(store.len(), 1 + 2 * depth);
        assert_eq!(pasted[0].parent.as_deref(), Some(root_id.as_str()));
        for pair in pasted.windows(2) {
            assert_eq!(pair[1].parent.as_deref(), Some(pair[0].id.as_str()));
        }

        let deepest = &pasted[depth - 1];
        assert_eq!(deepest.name, format!("Level {}", depth - 1));
        assert_eq!(store.ancestors(&deepest.id)?.len(), depth + 1);
        assert_eq!(store.project().len(), 1 + 2 * depth);
        store.check_invariants()?;
        Ok(())
    }

    #[test]
    fn test_blank_names_never_reach_the_store() {
        let mut store = HierarchyStore::with_root("Root", "");
        let root_id = store.root_id().unwrap().to_string();
        let revision = store.revision();

        let mut forest = PortableForest::new();
        let err = forest.push(None, "   ", "").unwrap_err();
        assert!(matches!(err, TreeError::InvalidPasteData { .. }));

        let err = store.paste_forest(&root_id, &forest).unwrap_err();
        assert!(matches!(err, TreeError::InvalidPasteData { .. }));

        let err = store
            .paste_as_child(&root_id, r#"[{"name": "  "}, {"label": "\t"}]"#)
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidPasteData { .. }));

        assert_eq!(store.len(), 1);
        assert_eq!(store.revision(), revision);
        assert!(store.check_invariants().is_ok());
    }
}
