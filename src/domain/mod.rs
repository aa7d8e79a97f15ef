//! Domain layer: person records, the family forest and its traversal
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod diagnostics;
pub mod flatten;
pub mod person;

pub use arena::{Forest, TreeNode};
pub use builder::HierarchyBuilder;
pub use diagnostics::Diagnostic;
pub use flatten::{RenderEvent, TreeFlattener};
pub use person::PersonRecord;
