//! Workspace
//!
//! Wires the [`HierarchyStore`] to its edge collaborators:
//!
//! - startup load of the tree, collapsed view state and prompt templates,
//!   falling back to a seeded root when nothing usable is stored
//! - debounced persistence after every successful mutation through the
//!   [`Autosaver`]
//! - asynchronous clipboard copy and paste
//! - file import/export and backup snapshots
//!
//! The store stays synchronous. All awaiting happens here, and a paste only
//! touches the store after the clipboard read has completed, so a failed
//! read can never leave a partial change behind.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, watch};

use crate::clipboard::{ClipboardError, ClipboardProvider};
use crate::codec::{self, BackupSnapshot};
use crate::config::WorkspaceConfig;
use crate::models::{CollapsedSet, Node, PromptLibrary, PromptTemplate, ValidationError};
use crate::services::{HierarchyStore, ReparentOutcome, TreeError, TreeEvent};
use crate::storage::{Autosaver, FileStore, KeyValueStore, SaveStatus, StorageError};
use crate::view::ViewRow;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error("Prompt template '{id}' does not exist")]
    PromptNotFound { id: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl WorkspaceError {
    /// Text suitable for a toast or inline message
    pub fn user_message(&self) -> String {
        match self {
            Self::Clipboard(ClipboardError::PermissionDenied) => {
                "Clipboard access was denied. Allow clipboard access and try again.".to_string()
            }
            Self::Clipboard(ClipboardError::Unavailable(_)) => {
                "The clipboard is not available right now.".to_string()
            }
            Self::Storage(e) => format!("Your changes could not be saved: {}", e),
            other => other.to_string(),
        }
    }

    /// Whether the session can simply continue after showing the message
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Tree(TreeError::Serialization(_)) | Self::Config(_)
        )
    }
}

/// An open concept tree with its persistence and clipboard collaborators
pub struct Workspace {
    store: HierarchyStore,
    prompts: PromptLibrary,
    clipboard: Arc<dyn ClipboardProvider>,
    autosaver: Autosaver,
    config: WorkspaceConfig,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("nodes", &self.store.len())
            .field("prompts", &self.prompts.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Load the workspace from `storage`
    ///
    /// Missing or unusable stored values never fail the open: the tree falls
    /// back to a seeded root, the view to fully expanded, and prompts to an
    /// empty library. Only an invalid configuration is an error.
    pub async fn open(
        storage: Arc<dyn KeyValueStore>,
        clipboard: Arc<dyn ClipboardProvider>,
        config: WorkspaceConfig,
    ) -> Result<Self, WorkspaceError> {
        config
            .validate()
            .map_err(|e| WorkspaceError::Config(format!("{:#}", e)))?;

        let (mut store, seeded) = match load_value(storage.as_ref(), &config.tree_key).await {
            Some(json) => match codec::import_tree(&json).and_then(HierarchyStore::from_nodes) {
                Ok(store) => (store, false),
                Err(e) => {
                    tracing::warn!("Stored tree is unusable, starting fresh: {}", e);
                    (seed_store(&config), true)
                }
            },
            None => {
                tracing::info!("No saved tree found, seeding '{}'", config.seed_root_name);
                (seed_store(&config), true)
            }
        };

        if !seeded {
            if let Some(json) = load_value(storage.as_ref(), &config.view_key).await {
                match serde_json::from_str::<CollapsedSet>(&json) {
                    Ok(collapsed) => store.restore_collapsed(collapsed),
                    Err(e) => tracing::warn!("Ignoring unreadable view state: {}", e),
                }
            }
        }

        let prompts = match load_value(storage.as_ref(), &config.prompts_key).await {
            Some(json) => serde_json::from_str::<PromptLibrary>(&json).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable prompt templates: {}", e);
                PromptLibrary::new()
            }),
            None => PromptLibrary::new(),
        };

        tracing::info!(
            "Opened workspace with {} nodes and {} prompt templates",
            store.len(),
            prompts.len()
        );

        let autosaver = Autosaver::spawn(storage, config.autosave_delay());
        let workspace = Self {
            store,
            prompts,
            clipboard,
            autosaver,
            config,
        };
        if seeded {
            workspace.persist_tree();
        }
        Ok(workspace)
    }

    /// Open with file-backed storage in the configured data directory
    pub async fn open_in_data_dir(
        clipboard: Arc<dyn ClipboardProvider>,
        config: WorkspaceConfig,
    ) -> Result<Self, WorkspaceError> {
        let dir = config
            .resolve_data_dir()
            .map_err(|e| WorkspaceError::Config(format!("{:#}", e)))?;
        Self::open(Arc::new(FileStore::new(dir)), clipboard, config).await
    }

    pub fn store(&self) -> &HierarchyStore {
        &self.store
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn rows(&self) -> Vec<ViewRow<'_>> {
        self.store.project()
    }

    pub fn subscribe_to_events(&self) -> broadcast::Receiver<TreeEvent> {
        self.store.subscribe_to_events()
    }

    // Tree editing

    /// Replace the whole tree with a single fresh root
    pub fn new_tree(&mut self, name: &str, description: &str) -> Node {
        let root = self.store.create_root(name, description);
        self.persist_tree();
        root
    }

    pub fn add_child(
        &mut self,
        parent_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Node, WorkspaceError> {
        let node = self.store.add_child(parent_id, name, description)?;
        self.persist_tree();
        Ok(node)
    }

    pub fn rename_and_describe(
        &mut self,
        node_id: &str,
        name: &str,
        description: &str,
    ) -> Result<(), WorkspaceError> {
        self.store.rename_and_describe(node_id, name, description)?;
        self.persist_tree();
        Ok(())
    }

    pub fn reparent(
        &mut self,
        drag_id: &str,
        drop_target_id: &str,
    ) -> Result<ReparentOutcome, WorkspaceError> {
        let outcome = self.store.reparent(drag_id, drop_target_id)?;
        match outcome {
            ReparentOutcome::Moved => self.persist_tree(),
            ReparentOutcome::Unchanged => self.persist_view(),
        }
        Ok(outcome)
    }

    pub fn delete_subtree(&mut self, node_id: &str) -> Result<Vec<String>, WorkspaceError> {
        let removed = self.store.delete_subtree(node_id)?;
        if !removed.is_empty() {
            self.persist_tree();
        }
        Ok(removed)
    }

    // View state

    pub fn toggle_collapsed(&mut self, id: &str) -> Result<bool, WorkspaceError> {
        let collapsed = self.store.toggle_collapsed(id)?;
        self.persist_view();
        Ok(collapsed)
    }

    pub fn expand_all(&mut self) {
        self.store.expand_all();
        self.persist_view();
    }

    pub fn collapse_all(&mut self) {
        self.store.collapse_all();
        self.persist_view();
    }

    // Clipboard

    /// Copy `node_id` and its descendants to the clipboard
    pub async fn copy_to_clipboard(&self, node_id: &str) -> Result<(), WorkspaceError> {
        let json = self.store.copy_subtree(node_id)?;
        self.clipboard.write_text(&json).await.inspect_err(|e| {
            tracing::warn!("Copy of {} failed: {}", node_id, e);
        })?;
        tracing::debug!("Copied subtree {} to clipboard", node_id);
        Ok(())
    }

    /// Paste the clipboard contents under `parent_id`
    pub async fn paste_from_clipboard(&mut self, parent_id: &str) -> Result<Vec<Node>, WorkspaceError> {
        if !self.store.contains(parent_id) {
            return Err(TreeError::node_not_found(parent_id).into());
        }
        let text = self.clipboard.read_text().await.inspect_err(|e| {
            tracing::warn!("Paste under {} failed: {}", parent_id, e);
        })?;

        let created = self.store.paste_as_child(parent_id, &text)?;
        self.persist_tree();
        Ok(created)
    }

    // Files and backups

    pub fn export_file(&self) -> Result<String, WorkspaceError> {
        Ok(codec::export_tree(self.store.nodes())?)
    }

    pub fn export_markdown(&self) -> String {
        codec::export_markdown_outline(self.store.nodes())
    }

    /// Replace the tree with an imported file; all-or-nothing
    pub fn import_file(&mut self, json: &str) -> Result<(), WorkspaceError> {
        let nodes = codec::import_tree(json)?;
        self.store.replace_all(nodes)?;
        self.persist_tree();
        Ok(())
    }

    pub fn backup_snapshot(&self) -> Result<String, WorkspaceError> {
        let snapshot = BackupSnapshot::capture(self.store.nodes(), &self.prompts);
        Ok(snapshot.to_json()?)
    }

    /// Replace tree and prompt templates from a backup document
    pub fn restore_snapshot(&mut self, json: &str) -> Result<(), WorkspaceError> {
        let snapshot = BackupSnapshot::from_json(json)?;
        self.store.replace_all(snapshot.nodes)?;
        self.prompts = snapshot.prompts;

        tracing::info!(
            "Restored backup taken at {} ({} nodes)",
            snapshot.exported_at,
            self.store.len()
        );
        self.persist_tree();
        self.persist_prompts();
        Ok(())
    }

    // Prompt templates

    pub fn prompts(&self) -> &PromptLibrary {
        &self.prompts
    }

    pub fn add_prompt(&mut self, title: &str, body: &str) -> Result<PromptTemplate, WorkspaceError> {
        let template = self.prompts.add(title, body)?;
        self.persist_prompts();
        Ok(template)
    }

    pub fn update_prompt(&mut self, id: &str, title: &str, body: &str) -> Result<(), WorkspaceError> {
        if !self.prompts.update(id, title, body)? {
            return Err(WorkspaceError::PromptNotFound { id: id.to_string() });
        }
        self.persist_prompts();
        Ok(())
    }

    pub fn remove_prompt(&mut self, id: &str) -> Result<PromptTemplate, WorkspaceError> {
        let removed = self
            .prompts
            .remove(id)
            .ok_or_else(|| WorkspaceError::PromptNotFound { id: id.to_string() })?;
        self.persist_prompts();
        Ok(removed)
    }

    /// Render a prompt template for the given node
    pub fn render_prompt(&self, prompt_id: &str, node_id: &str) -> Result<String, WorkspaceError> {
        let template = self
            .prompts
            .get(prompt_id)
            .ok_or_else(|| WorkspaceError::PromptNotFound {
                id: prompt_id.to_string(),
            })?;
        let path = self.store.ancestors(node_id)?;
        let node = self
            .store
            .get(node_id)
            .ok_or_else(|| TreeError::node_not_found(node_id))?;
        Ok(template.render(node, &path))
    }

    // Persistence

    pub fn save_status(&self) -> SaveStatus {
        self.autosaver.status()
    }

    pub fn subscribe_save_status(&self) -> watch::Receiver<SaveStatus> {
        self.autosaver.subscribe_status()
    }

    /// Write all pending changes now
    pub async fn flush(&self) -> Result<(), WorkspaceError> {
        Ok(self.autosaver.flush().await?)
    }

    /// Flush pending changes and stop the background writer
    pub async fn close(self) -> Result<(), WorkspaceError> {
        Ok(self.autosaver.shutdown().await?)
    }

    /// Tree mutations may also change the collapsed set
    fn persist_tree(&self) {
        match codec::export_tree(self.store.nodes()) {
            Ok(json) => self.autosaver.schedule(&self.config.tree_key, json),
            Err(e) => tracing::warn!("Failed to encode tree for saving: {}", e),
        }
        self.persist_view();
    }

    fn persist_view(&self) {
        match serde_json::to_string(self.store.collapsed()) {
            Ok(json) => self.autosaver.schedule(&self.config.view_key, json),
            Err(e) => tracing::warn!("Failed to encode view state for saving: {}", e),
        }
    }

    fn persist_prompts(&self) {
        match serde_json::to_string(&self.prompts) {
            Ok(json) => self.autosaver.schedule(&self.config.prompts_key, json),
            Err(e) => tracing::warn!("Failed to encode prompt templates for saving: {}", e),
        }
    }
}

fn seed_store(config: &WorkspaceConfig) -> HierarchyStore {
    HierarchyStore::with_root(&config.seed_root_name, &config.seed_root_description)
}

/// Load errors are treated like missing values so startup always succeeds
async fn load_value(storage: &dyn KeyValueStore, key: &str) -> Option<String> {
    match storage.load(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to load '{}': {}", key, e);
            None
        }
    }
}
