//! Tree Services
//!
//! - `HierarchyStore` - owner of the node collection and every invariant-preserving mutation
//! - `ChildrenIndex` - shared parent → children lookup used for downward walks
//! - `TreeEvent` - change notifications broadcast after successful mutations
//! - `TreeError` - rejection reasons for tree operations

pub mod children_index;
pub mod error;
pub mod events;
pub mod hierarchy_store;

pub use children_index::ChildrenIndex;
pub use error::TreeError;
pub use events::TreeEvent;
pub use hierarchy_store::{validate_structure, HierarchyStore, ReparentOutcome};
