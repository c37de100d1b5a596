//! Error types for the execution engine
//!
//! Predictable failures of a run (timeouts, failed gem installs, scripts that
//! exit non-zero) are reported as data in a `CommandResult`. The variants here
//! cover the conditions that abort a call outright: bad configuration, a
//! workspace that cannot be created, or malformed tool arguments.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ExecError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Workspace error: {0}")]
    Workspace(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Tool execution failed for '{tool_name}': {message}")]
    ToolError { tool_name: String, message: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for ExecError {
    fn from(err: std::io::Error) -> Self {
        ExecError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExecError {
    fn from(err: serde_json::Error) -> Self {
        ExecError::Serialization(err.to_string())
    }
}
