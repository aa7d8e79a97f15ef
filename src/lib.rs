//! kintree: rebuild a family forest from flat person records.
//!
//! The core is [`domain::HierarchyBuilder`], which turns person records with
//! parent references and marriage tags into a [`domain::Forest`], and
//! [`domain::TreeFlattener`], which walks that forest as a cycle-safe
//! sequence of [`domain::RenderEvent`]s.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{
    Diagnostic, Forest, HierarchyBuilder, PersonRecord, RenderEvent, TreeFlattener, TreeNode,
};
