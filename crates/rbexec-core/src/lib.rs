//! Run untrusted Ruby snippets with optional gem dependencies.
//!
//! The crate takes a piece of Ruby source, optionally installs a list of gems
//! for it, runs it under a hard wall-clock limit, and returns the exit status
//! together with trimmed stdout and stderr.
//!
//! # Architecture Overview
//!
//! - **Command runner**: one bounded subprocess per call, timeout reported as
//!   return code `-2`
//! - **Dependency installer**: `gem install`, skipping gems the shared store
//!   already holds
//! - **Local executor**: picks shared or isolated gem storage, builds the child
//!   environment, and removes the throwaway workspace on every exit path
//! - **Tools**: a JSON-in, JSON-out wrapper for agent frameworks
//! - **Configuration**: YAML plus `RBEXEC_*` environment overrides
//!
//! Isolation here only concerns gem installation state. Executed code keeps
//! full access to the host.

pub mod config;
pub mod errors;
pub mod executors;
pub mod tools;

pub use config::{ConfigLoader, ExecConfig};
pub use errors::ExecError;
pub use executors::{CodeExecutor, CommandResult, ExecutionRequest, LocalCodeExecutor};
pub use tools::{CodeExecutionTool, Tool};
