use std::path::PathBuf;

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Error during file I/O operations
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization or deserialization
    #[error("json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    /// Error when user input fails.
    #[error("inquire error: {0}")]
    Inquire(#[from] inquire::InquireError),
    /// Error during input validation.
    #[error("validation error: {0}")]
    Validation(String),
    /// Error when a stored identity is not found.
    #[error("identity not found: '{0}'")]
    IdentityNotFound(String),
    /// Error when executing Git commands
    #[error("git command failed: {0}")]
    GitCommand(String),
    /// Error when the workspace is not a Git repository
    #[error("not in git repository")]
    GitNotRepository,
    /// Error when the key-pair tool fails or its output cannot be read
    #[error("key generation failed: {0}")]
    KeyGeneration(String),
    /// Error when a key file for the identity is already on disk
    #[error("key file already exists: {}", .0.display())]
    KeyExists(PathBuf),
    /// Error when the SSH client configuration cannot be read or written
    #[error("failed to update ssh config {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Error when copying to the clipboard fails
    #[error("clipboard error: {0}")]
    Clipboard(String),
    /// Error when an external process exceeds its time limit; `output` holds
    /// whatever it printed before being killed
    #[error("'{program}' timed out after {seconds}s")]
    ProcessTimeout {
        program: String,
        seconds: u64,
        output: String,
    },
    /// Error when a wizard step is triggered before its prerequisites exist
    #[error("wizard step out of order: {0}")]
    StepOutOfOrder(String),
    /// Error when a wizard step is triggered while another one is running
    #[error("another wizard step is still running")]
    StepInProgress,
}
