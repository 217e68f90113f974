// ABOUTME: Core types, traits, and utilities for Tandem
// ABOUTME: Foundational package providing shared functionality across all Tandem packages

pub mod constants;
pub mod principal;
pub mod utils;

// Re-export main types
pub use principal::{Principal, Role};

// Re-export constants
pub use constants::tandem_dir;

// Re-export utilities
pub use utils::generate_id;
