//! Configuration loader for YAML files and environment overrides
//!
//! Values from the file are applied first, then any `RBEXEC_*` variables set in
//! the host environment, then the result is validated.

use crate::config::types::ExecConfig;
use crate::errors::ExecError;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const ENV_INTERPRETER: &str = "RBEXEC_INTERPRETER";
pub const ENV_PACKAGE_MANAGER: &str = "RBEXEC_PACKAGE_MANAGER";
pub const ENV_TIMEOUT: &str = "RBEXEC_TIMEOUT";
pub const ENV_ALWAYS_ISOLATED: &str = "RBEXEC_ALWAYS_ISOLATED";
pub const ENV_SHARED_INSTALL_DIR: &str = "RBEXEC_SHARED_INSTALL_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<ExecConfig, ExecError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            ExecError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<ExecConfig, ExecError> {
        let mut config: ExecConfig = if content.trim().is_empty() {
            ExecConfig::default()
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| ExecError::Config(format!("Failed to parse YAML config: {}", e)))?
        };

        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Defaults plus environment overrides, for callers without a config file.
    pub fn from_env() -> Result<ExecConfig, ExecError> {
        Self::from_str("")
    }

    fn apply_env_overrides<F>(config: &mut ExecConfig, lookup: F) -> Result<(), ExecError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(interpreter) = lookup(ENV_INTERPRETER) {
            config.interpreter = interpreter;
        }

        if let Some(package_manager) = lookup(ENV_PACKAGE_MANAGER) {
            config.package_manager = package_manager;
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            config.timeout = timeout.trim().parse().map_err(|_| {
                ExecError::Config(format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT, timeout))
            })?;
        }

        if let Some(flag) = lookup(ENV_ALWAYS_ISOLATED) {
            config.always_isolated = parse_flag(&flag).ok_or_else(|| {
                ExecError::Config(format!("{} must be true or false, got '{}'", ENV_ALWAYS_ISOLATED, flag))
            })?;
        }

        if let Some(dir) = lookup(ENV_SHARED_INSTALL_DIR) {
            if !dir.is_empty() {
                config.shared_install_dir = Some(PathBuf::from(dir));
            }
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
