//! Error types for the redscan execution substrate

use std::time::Duration;
use thiserror::Error;

/// Result type alias for substrate operations
pub type ExecResult<T> = Result<T, ExecError>;

/// Every way an invocation can fail.
///
/// Non-zero exit codes from the wrapped tool are not runner-level errors;
/// they surface as [`ExecError::ToolFailure`] only once the result
/// normalizer shapes the protocol response. Nothing in this taxonomy is
/// ever retried by this layer.
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Executable missing, unreadable, or otherwise unable to start
    #[error("Failed to start `{command}`: {message}")]
    StartFailure { command: String, message: String },

    /// Wall-clock budget exceeded; the process was killed
    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// Combined stdout + stderr exceeded the byte budget; the process was killed
    #[error("`{command}` output exceeded {limit} bytes limit")]
    OutputCapExceeded { command: String, limit: u64 },

    /// The caller withdrew the request; distinct from a tool malfunction
    #[error("`{command}` was cancelled")]
    Cancelled { command: String },

    /// The tool ran to completion but reported failure
    #[error("{tool} exited with code {code}:\n{detail}")]
    ToolFailure {
        tool: String,
        code: i32,
        detail: String,
    },

    /// The tool died to a signal before reporting an exit code
    #[error("{tool} was terminated by a signal:\n{detail}")]
    ToolSignalled { tool: String, detail: String },

    /// A caller-supplied path resolved outside its allowed root
    #[error("Path traversal detected: `{path}` escapes `{base}`")]
    PathTraversal { path: String, base: String },

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl ExecError {
    /// Create a new start failure error
    pub fn start_failure(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StartFailure {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a new cancellation error
    pub fn cancelled(command: impl Into<String>) -> Self {
        Self::Cancelled {
            command: command.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True when the invocation ended because the caller gave up
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<std::io::Error> for ExecError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<anyhow::Error> for ExecError {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(error.to_string())
    }
}
