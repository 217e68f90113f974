// ABOUTME: Message module for direct user-to-user communication
// ABOUTME: Each row is independently addressed; there is no thread entity

pub mod storage;
pub mod types;

pub use storage::*;
pub use types::*;
