//! Workspace Persistence and Clipboard Tests
//!
//! Exercises the async edges: reopening a workspace from disk, debounced
//! saves, storage failures that must not roll back edits, clipboard
//! permission failures that must not mutate, and file/backup round trips.

#[cfg(test)]
mod workspace_tests {
    use std::sync::Arc;

    use anyhow::Result;
    use concept_tree_core::clipboard::{ClipboardError, ClipboardProvider, MemoryClipboard};
    use concept_tree_core::config::WorkspaceConfig;
    use concept_tree_core::services::TreeEvent;
    use concept_tree_core::storage::{FileStore, KeyValueStore, MemoryStore, SaveStatus};
    use concept_tree_core::{TreeError, Workspace, WorkspaceError};
    use tempfile::TempDir;
    use tokio::time::{timeout, Duration};

    fn slow_config() -> WorkspaceConfig {
        WorkspaceConfig {
            autosave_delay_ms: 60_000,
            ..Default::default()
        }
    }

    async fn open_memory(storage: &MemoryStore, clipboard: &MemoryClipboard) -> Result<Workspace> {
        Ok(Workspace::open(
            Arc::new(storage.clone()),
            Arc::new(clipboard.clone()),
            slow_config(),
        )
        .await?)
    }

    #[tokio::test]
    async fn test_reopen_restores_tree_view_and_prompts() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(temp_dir.path()));
        let clipboard = Arc::new(MemoryClipboard::new());

        let mut workspace = Workspace::open(storage.clone(), clipboard.clone(), slow_config()).await?;
        let root_id = workspace.store().root_id().unwrap().to_string();
        let a = workspace.add_child(&root_id, "Algebra", "Symbols")?;
        workspace.add_child(&a.id, "Groups", "")?;
        workspace.toggle_collapsed(&a.id)?;
        workspace.add_prompt("Summarize", "Summarize {{name}}")?;
        workspace.close().await?;

        let reopened = Workspace::open(storage, clipboard, slow_config()).await?;
        assert_eq!(reopened.store().len(), 3);
        assert!(reopened.store().collapsed().is_collapsed(&a.id));
        assert_eq!(reopened.rows().len(), 2);
        assert_eq!(reopened.prompts().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_edits_are_debounced_into_one_write() -> Result<()> {
        let storage = MemoryStore::new();
        let mut workspace = open_memory(&storage, &MemoryClipboard::new()).await?;
        workspace.flush().await?;
        let baseline = storage.save_count();

        let root_id = workspace.store().root_id().unwrap().to_string();
        for name in ["One", "Two", "Three"] {
            workspace.add_child(&root_id, name, "")?;
        }
        assert_eq!(storage.save_count(), baseline);

        workspace.flush().await?;
        // one write for the tree, one for the view state
        assert_eq!(storage.save_count(), baseline + 2);
        assert!(matches!(workspace.save_status(), SaveStatus::Saved { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_in_memory_edits() -> Result<()> {
        let storage = MemoryStore::new();
        let mut workspace = open_memory(&storage, &MemoryClipboard::new()).await?;
        let root_id = workspace.store().root_id().unwrap().to_string();

        storage.set_fail_writes(true);
        let node = workspace.add_child(&root_id, "Unsaved", "")?;
        let err = workspace.flush().await.unwrap_err();

        assert!(err.is_recoverable());
        assert!(err.user_message().starts_with("Your changes could not be saved"));
        assert!(matches!(workspace.save_status(), SaveStatus::Failed(_)));
        assert!(workspace.store().contains(&node.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_clipboard_copy_then_paste() -> Result<()> {
        let clipboard = MemoryClipboard::new();
        let mut workspace = open_memory(&MemoryStore::new(), &clipboard).await?;
        let root_id = workspace.store().root_id().unwrap().to_string();
        let a = workspace.add_child(&root_id, "A", "")?;
        workspace.add_child(&a.id, "B", "")?;
        let target = workspace.add_child(&root_id, "Target", "")?;

        workspace.copy_to_clipboard(&a.id).await?;
        assert!(clipboard.read_text().await?.contains("\"name\": \"A\""));

        let pasted = workspace.paste_from_clipboard(&target.id).await?;
        assert_eq!(pasted.len(), 2);
        assert_eq!(workspace.store().len(), 6);
        assert_eq!(pasted[0].parent.as_deref(), Some(target.id.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn test_clipboard_denied_does_not_mutate() -> Result<()> {
        let clipboard = MemoryClipboard::new();
        let mut workspace = open_memory(&MemoryStore::new(), &clipboard).await?;
        let root_id = workspace.store().root_id().unwrap().to_string();
        workspace.copy_to_clipboard(&root_id).await?;

        clipboard.set_denied(true);
        let revision = workspace.store().revision();
        let err = workspace.paste_from_clipboard(&root_id).await.unwrap_err();

        assert!(matches!(
            err,
            WorkspaceError::Clipboard(ClipboardError::PermissionDenied)
        ));
        assert!(err.is_recoverable());
        assert_eq!(workspace.store().len(), 1);
        assert_eq!(workspace.store().revision(), revision);
        Ok(())
    }

    #[tokio::test]
    async fn test_paste_of_garbage_is_rejected() -> Result<()> {
        let clipboard = MemoryClipboard::new();
        let mut workspace = open_memory(&MemoryStore::new(), &clipboard).await?;
        let root_id = workspace.store().root_id().unwrap().to_string();

        clipboard.write_text("just some text").await?;
        let err = workspace.paste_from_clipboard(&root_id).await.unwrap_err();
        assert!(matches!(
            err,
            WorkspaceError::Tree(TreeError::InvalidPasteData { .. })
        ));
        assert_eq!(workspace.store().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_is_all_or_nothing() -> Result<()> {
        let mut workspace = open_memory(&MemoryStore::new(), &MemoryClipboard::new()).await?;
        let root_id = workspace.store().root_id().unwrap().to_string();
        workspace.add_child(&root_id, "Existing", "")?;

        let bad = r#"[
            {"id": "r", "name": "Imported", "description": "", "parent": null},
            {"id": "x", "name": "Broken", "description": null, "parent": "r"}
        ]"#;
        let err = workspace.import_file(bad).unwrap_err();
        assert!(err.user_message().contains("entry 1"));
        assert_eq!(workspace.store().len(), 2);

        let good = r#"[
            {"id": "r", "name": "Imported", "description": "", "parent": null},
            {"id": "x", "name": "Child", "description": "ok", "parent": "r"}
        ]"#;
        workspace.import_file(good)?;
        assert_eq!(workspace.store().root_id(), Some("r"));
        assert_eq!(workspace.export_markdown(), "- **Imported**\n  - **Child**: ok\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_backup_restore_round_trip() -> Result<()> {
        let mut workspace = open_memory(&MemoryStore::new(), &MemoryClipboard::new()).await?;
        let root_id = workspace.store().root_id().unwrap().to_string();
        workspace.add_child(&root_id, "Saved", "")?;
        workspace.add_prompt("Quiz", "Quiz me on {{name}}")?;
        let backup = workspace.backup_snapshot()?;

        workspace.new_tree("Scratch", "");
        let prompt_id = workspace.prompts().templates()[0].id.clone();
        workspace.remove_prompt(&prompt_id)?;
        assert_eq!(workspace.store().len(), 1);

        workspace.restore_snapshot(&backup)?;
        assert_eq!(workspace.store().len(), 2);
        assert_eq!(workspace.store().root_id(), Some(root_id.as_str()));
        assert_eq!(workspace.prompts().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_workspace_forwards_store_events() -> Result<()> {
        let mut workspace = open_memory(&MemoryStore::new(), &MemoryClipboard::new()).await?;
        let mut rx = workspace.subscribe_to_events();
        let root_id = workspace.store().root_id().unwrap().to_string();

        let node = workspace.add_child(&root_id, "Evented", "")?;
        let event = timeout(Duration::from_secs(1), rx.recv()).await??;
        assert_eq!(event, TreeEvent::NodeCreated(node));
        Ok(())
    }

    #[test]
    fn test_file_store_outside_async_context() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        tokio_test::block_on(async {
            store.save("view", "[\"a\"]").await.unwrap();
            assert_eq!(store.load("view").await.unwrap().as_deref(), Some("[\"a\"]"));
        });
    }
}
