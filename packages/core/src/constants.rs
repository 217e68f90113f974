use std::env;
use std::path::PathBuf;

/// Get the path to the Tandem directory (~/.tandem)
pub fn tandem_dir() -> PathBuf {
    // First try HOME environment variable (useful for tests)
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".tandem")
    } else {
        // Fall back to dirs crate for normal usage
        dirs::home_dir()
            .expect("Unable to get home directory")
            .join(".tandem")
    }
}

/// Get the path to the uploaded-files directory (~/.tandem/uploads)
pub fn uploads_dir() -> PathBuf {
    tandem_dir().join("uploads")
}
