//! JSON codecs for moving trees in and out of the store
//!
//! - `clipboard` - portable subtrees for copy/paste (lenient per entry)
//! - `tree_file` - whole-tree file import/export (strict) and Markdown outlines
//! - `snapshot` - backup documents bundling the tree with prompt templates

pub mod clipboard;
pub mod snapshot;
pub mod tree_file;

pub use clipboard::{PortableEntry, PortableForest};
pub use snapshot::{BackupSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use tree_file::{export_markdown_outline, export_tree, import_tree};
