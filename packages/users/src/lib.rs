// ABOUTME: User account module with role management support
// ABOUTME: Provides types and storage for users and their settings

pub mod storage;
pub mod types;

pub use storage::*;
pub use types::*;
