//! Tool surface for agents that want code executed on their behalf.
//!
//! A tool describes itself with a name, a description, and a JSON schema for its
//! arguments, and is invoked with a JSON value. Results come back as text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ExecError;

pub mod code_execution;

pub use code_execution::CodeExecutionTool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

// Core Tool trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    fn metadata(&self) -> ToolMetadata;
    async fn execute(&self, arguments: Value) -> Result<String, ExecError>;
}
