//! Read-only views over the tree

mod projector;

pub use projector::{project, project_with_index, ViewRow};
