//! Error types for the openports-core library.

use thiserror::Error;

/// Result type alias for openports operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running diagnostic commands and parsing
/// their output.
///
/// Scanner-level callers treat every command error the same way: the tool
/// is unavailable and the scan degrades to an empty record set.
#[derive(Error, Debug)]
pub enum Error {
    /// The external command is not installed or not on the search path.
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// The command did not finish within the hard timeout and was killed.
    #[error("Command {command} timed out after {timeout_ms}ms")]
    CommandTimeout { command: String, timeout_ms: u64 },

    /// The command exited with a non-zero status or could not be spawned.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// The command produced more output than the configured cap allows.
    #[error("Command {command} exceeded output limit of {limit} bytes")]
    OutputTooLarge { command: String, limit: usize },

    /// Failed to parse command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),
}
