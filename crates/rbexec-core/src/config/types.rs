//! Configuration type definitions for the execution engine
//!
//! Every field carries a default so an empty YAML document (or no file at all)
//! yields a working configuration: `ruby` and `gem` from `PATH`, a 60 second
//! wall-clock budget, and gems shared through `~/.gem`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ExecError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_package_manager")]
    pub package_manager: String,
    /// Wall-clock budget for every spawned process, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Force isolated mode for every request regardless of what it asks for.
    #[serde(default)]
    pub always_isolated: bool,
    /// Skip gems the shared store already has before installing.
    #[serde(default = "default_true")]
    pub skip_installed: bool,
    #[serde(default)]
    pub shared_install_dir: Option<PathBuf>,
    #[serde(default = "default_script_name")]
    pub script_name: String,
    #[serde(default = "default_workspace_prefix")]
    pub workspace_prefix: String,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Extra variables handed to every child process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_interpreter() -> String { "ruby".to_string() }
fn default_package_manager() -> String { "gem".to_string() }
fn default_timeout() -> u64 { 60 }
fn default_true() -> bool { true }
fn default_script_name() -> String { "script.rb".to_string() }
fn default_workspace_prefix() -> String { "code-exec-".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            package_manager: default_package_manager(),
            timeout: default_timeout(),
            always_isolated: false,
            skip_installed: true,
            shared_install_dir: None,
            script_name: default_script_name(),
            workspace_prefix: default_workspace_prefix(),
            environment: EnvironmentConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ExecConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExecError> {
        if self.interpreter.trim().is_empty() {
            return Err(ExecError::Config("Interpreter cannot be empty".to_string()));
        }

        if self.package_manager.trim().is_empty() {
            return Err(ExecError::Config("Package manager cannot be empty".to_string()));
        }

        if self.timeout == 0 {
            return Err(ExecError::Config("Timeout must be greater than 0".to_string()));
        }

        let script = Path::new(&self.script_name);
        if self.script_name.is_empty() || script.file_name().map(|n| n != script.as_os_str()).unwrap_or(true) {
            return Err(ExecError::Config(format!(
                "Script name must be a bare file name, got '{}'",
                self.script_name
            )));
        }

        Ok(())
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// The persistent gem store used by shared-mode runs.
    pub fn resolve_shared_install_dir(&self) -> Result<PathBuf, ExecError> {
        if let Some(dir) = &self.shared_install_dir {
            Ok(dir.clone())
        } else {
            dirs::home_dir()
                .map(|home| home.join(".gem"))
                .ok_or_else(|| {
                    ExecError::Config("Could not determine home directory.".to_string())
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExecConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.interpreter, "ruby");
        assert_eq!(config.package_manager, "gem");
        assert_eq!(config.timeout_duration(), Duration::from_secs(60));
        assert!(!config.always_isolated);
        assert!(config.skip_installed);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = ExecConfig {
            timeout: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ExecError::Config(_))));
    }

    #[test]
    fn test_rejects_nested_script_name() {
        for name in ["", "../escape.rb", "dir/script.rb", "/tmp/script.rb"] {
            let config = ExecConfig {
                script_name: name.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "accepted script name {:?}", name);
        }
    }

    #[test]
    fn test_explicit_shared_install_dir_wins() {
        let config = ExecConfig {
            shared_install_dir: Some(PathBuf::from("/opt/gems")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_shared_install_dir().unwrap(),
            PathBuf::from("/opt/gems")
        );
    }
}
