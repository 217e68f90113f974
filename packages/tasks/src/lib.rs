// ABOUTME: Task management module with parent/subtask support
// ABOUTME: Provides types and storage for tasks and project progress aggregation

pub mod storage;
pub mod types;

pub use storage::*;
pub use types::*;
