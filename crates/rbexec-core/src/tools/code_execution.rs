//! `code_exec_ruby`: run a Ruby snippet, optionally after installing gems.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::errors::ExecError;
use crate::executors::{CodeExecutor, ExecutionRequest};
use crate::tools::{Tool, ToolMetadata};

pub const TOOL_NAME: &str = "code_exec_ruby";

pub struct CodeExecutionTool {
    executor: Arc<dyn CodeExecutor>,
}

impl CodeExecutionTool {
    pub fn new(executor: Arc<dyn CodeExecutor>) -> Self {
        Self { executor }
    }

    fn parse_arguments(arguments: Value) -> Result<ExecutionRequest, ExecError> {
        if !arguments.get("code").map(Value::is_string).unwrap_or(false) {
            return Err(ExecError::ToolError {
                tool_name: TOOL_NAME.to_string(),
                message: "Missing or invalid 'code' parameter".to_string(),
            });
        }

        serde_json::from_value(arguments).map_err(|e| ExecError::ToolError {
            tool_name: TOOL_NAME.to_string(),
            message: format!("Invalid arguments: {}", e),
        })
    }
}

#[async_trait]
impl Tool for CodeExecutionTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: TOOL_NAME.to_string(),
            description: "Executes a Ruby code snippet with optional gem dependencies. \
                When use_temp_dir is true, the code and any installed gems live in a throwaway \
                temporary directory and do not affect or reuse the user's ~/.gem folder. \
                The Ruby runtime has access to networking, the filesystem, and standard \
                libraries; this is not a secure sandbox. Returns JSON with returncode, stdout \
                and stderr."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "The Ruby code to execute as a string."
                    },
                    "packages": {
                        "type": ["array", "null"],
                        "items": {"type": "string"},
                        "description": "Optional list of gem names to install before execution."
                    },
                    "use_temp_dir": {
                        "type": "boolean",
                        "default": false,
                        "description": "If true, code and gems run in an isolated temporary directory. Not a secure sandbox."
                    }
                },
                "required": ["code"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<String, ExecError> {
        let request = Self::parse_arguments(arguments)?;
        let result = self.executor.execute_code(&request).await?;
        Ok(serde_json::to_string(&result)?)
    }
}
