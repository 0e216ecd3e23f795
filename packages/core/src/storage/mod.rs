//! Persistence
//!
//! - `KeyValueStore` - async save/load contract, with memory and file backends
//! - `Autosaver` - debounced background writer used by the workspace
//! - `StorageError` - non-fatal persistence failures

pub mod autosave;
pub mod error;
pub mod key_value;

pub use autosave::{Autosaver, SaveStatus};
pub use error::StorageError;
pub use key_value::{FileStore, KeyValueStore, MemoryStore};
