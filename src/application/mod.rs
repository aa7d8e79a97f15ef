//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod render;
pub mod roster;
pub mod services;

pub use error::{ApplicationError, ApplicationResult, SnapshotError};
pub use error_ext::IoResultExt;
