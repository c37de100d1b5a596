//! Configuration module for the execution engine
//!
//! Supports YAML configuration files, `RBEXEC_*` environment overrides, and
//! programmatic construction through `ExecConfig::default()`.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;

use crate::errors::ExecError;
use std::path::Path;

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "rbexec.yaml";

/// Load the configuration from `path`, else from `./rbexec.yaml` when it
/// exists, else from defaults plus `RBEXEC_*` overrides.
pub async fn load_config(path: Option<&Path>) -> Result<ExecConfig, ExecError> {
    match path {
        Some(path) => ConfigLoader::from_file(path).await,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            ConfigLoader::from_file(DEFAULT_CONFIG_FILE).await
        }
        None => ConfigLoader::from_env(),
    }
}
