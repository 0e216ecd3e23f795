//! Concept Tree Core
//!
//! Data model and editing engine for hierarchical concept trees: a single
//! root with named, described nodes that can be added, edited, deleted,
//! dragged to a new parent, collapsed, copied and pasted, and moved in and
//! out of JSON files.
//!
//! # Architecture
//!
//! - **Flat parent pointers**: the tree is a list of `{id, name, description, parent}`
//!   records; nested JSON is only an input format normalized by the codecs
//! - **Single owner**: [`services::HierarchyStore`] performs every mutation
//!   synchronously and either applies it fully or rejects it untouched
//! - **Async edges**: persistence and clipboard access live in [`workspace`],
//!   [`storage`] and [`clipboard`], never inside the store
//!
//! # Modules
//!
//! - [`identity`] - Node id generation
//! - [`models`] - Data structures (Node, CollapsedSet, prompt templates)
//! - [`services`] - Hierarchy store, children index, errors and events
//! - [`view`] - Projection of the tree into display rows
//! - [`codec`] - Clipboard, file and backup JSON formats
//! - [`storage`] - Key-value persistence and debounced autosave
//! - [`clipboard`] - Async clipboard collaborator
//! - [`workspace`] - Store wired to storage and clipboard
//! - [`config`] - Workspace configuration
//! - [`logging`] - Tracing subscriber setup

pub mod clipboard;
pub mod codec;
pub mod config;
pub mod identity;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;
pub mod view;
pub mod workspace;

// Re-export commonly used types
pub use models::*;
pub use services::*;
pub use view::{project, ViewRow};
pub use workspace::{Workspace, WorkspaceError};
