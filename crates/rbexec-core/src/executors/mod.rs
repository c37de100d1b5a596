//! Code execution for Ruby snippets with optional gem dependencies.
//!
//! A request is run either against the user's shared gem store or inside a
//! throwaway workspace whose gem tree is discarded afterwards. This is not a
//! security sandbox: the executed code keeps full access to the filesystem,
//! the network and process spawning. "Isolated" only means gem installs are
//! not shared between runs.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ExecError;

pub mod environment;
pub mod installer;
pub mod local;
pub mod runner;
pub mod workspace;

pub use environment::ExecutionEnvironment;
pub use installer::DependencyInstaller;
pub use local::LocalCodeExecutor;
pub use runner::CommandRunner;
pub use workspace::EphemeralWorkspace;

pub const TIMEOUT_MESSAGE: &str = "Error: Execution timed out";
pub const INSTALL_FAILURE_PREFIX: &str = "Dependency install failed:\n";

/// Outcome of one subprocess invocation, or of a whole request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    /// The process could not be started at all.
    pub const LAUNCH_FAILED: i32 = -1;
    /// The process was killed after exceeding its time budget.
    pub const TIMED_OUT: i32 = -2;

    pub fn noop() -> Self {
        Self {
            returncode: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn timed_out() -> Self {
        Self {
            returncode: Self::TIMED_OUT,
            stdout: String::new(),
            stderr: TIMEOUT_MESSAGE.to_string(),
        }
    }

    pub fn launch_failure(program: &str, reason: &str) -> Self {
        Self {
            returncode: Self::LAUNCH_FAILED,
            stdout: String::new(),
            stderr: format!("Error: failed to launch {}: {}", program, reason),
        }
    }

    /// Wrap a failed install as the final result of a request.
    pub fn install_failure(install: CommandResult) -> Self {
        Self {
            returncode: install.returncode,
            stdout: install.stdout,
            stderr: format!("{}{}", INSTALL_FAILURE_PREFIX, install.stderr),
        }
    }

    pub fn is_success(&self) -> bool {
        self.returncode == 0
    }
}

/// A single "run this code" request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub code: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub packages: Vec<String>,
    #[serde(default, alias = "use_temp_dir")]
    pub isolated: bool,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn isolated(mut self, isolated: bool) -> Self {
        self.isolated = isolated;
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute_code(&self, request: &ExecutionRequest) -> Result<CommandResult, ExecError>;
}
