//! Data Models
//!
//! - [`Node`] - one concept in the flat parent-pointer tree
//! - [`CollapsedSet`] - presentation state (which nodes hide their children)
//! - [`PromptTemplate`] / [`PromptLibrary`] - AI prompt templates kept beside the tree

mod node;
mod prompt;
mod view_state;

pub use node::{normalize_name, Node, ValidationError, DEFAULT_ROOT_NAME};
pub use prompt::{PromptLibrary, PromptTemplate, PATH_SEPARATOR};
pub use view_state::CollapsedSet;
