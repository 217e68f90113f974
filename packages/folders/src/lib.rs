// ABOUTME: Hierarchical folder module for project documents
// ABOUTME: Tree operations with cycle prevention and reparent-on-force-delete

pub mod storage;
pub mod types;

pub use storage::*;
pub use types::*;
