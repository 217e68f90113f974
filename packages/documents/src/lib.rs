// ABOUTME: Document registry module for project files
// ABOUTME: Metadata rows in SQLite, binary payloads behind the FileStore seam

pub mod files;
pub mod storage;
pub mod types;

pub use files::{FileStore, FileStoreError, LocalFileStore, StoredFile};
pub use storage::*;
pub use types::*;
