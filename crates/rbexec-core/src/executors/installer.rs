//! Gem installation ahead of a run.
//!
//! Installs go through the configured `gem` executable via `CommandRunner`, so
//! they share its timeout and result shape.

use super::environment::ExecutionEnvironment;
use super::runner::CommandRunner;
use super::CommandResult;

#[derive(Debug, Clone)]
pub struct DependencyInstaller {
    package_manager: String,
    runner: CommandRunner,
}

impl DependencyInstaller {
    pub fn new(package_manager: impl Into<String>, runner: CommandRunner) -> Self {
        Self {
            package_manager: package_manager.into(),
            runner,
        }
    }

    /// Install `packages`, or succeed immediately when there are none.
    ///
    /// Without `env` the gems go to the invoking user's default store
    /// (`--user-install`). With `env` its `GEM_HOME` decides the install root
    /// and the flag is left off.
    pub async fn install(
        &self,
        packages: &[String],
        env: Option<&ExecutionEnvironment>,
    ) -> CommandResult {
        if packages.is_empty() {
            return CommandResult::noop();
        }

        let argv = self.install_command(packages, env.is_none());
        log::info!("Installing gems: {}", packages.join(", "));
        let result = self.runner.run(&argv, env).await;

        if result.is_success() {
            log::debug!("Gem install finished: {}", result.stdout);
        } else {
            log::warn!(
                "Gem install exited with {}: {}",
                result.returncode,
                result.stderr
            );
        }
        result
    }

    /// Whether `package` is already present in the store `env` points at.
    pub async fn is_installed(&self, package: &str, env: Option<&ExecutionEnvironment>) -> bool {
        let argv = vec![
            self.package_manager.clone(),
            "list".to_string(),
            "--installed".to_string(),
            "--exact".to_string(),
            "--".to_string(),
            package.to_string(),
        ];
        let result = self.runner.run(&argv, env).await;
        result.stdout == "true"
    }

    /// Drop packages the store already has, and duplicates, keeping order.
    pub async fn filter_installed(
        &self,
        packages: &[String],
        env: Option<&ExecutionEnvironment>,
    ) -> Vec<String> {
        let mut missing: Vec<String> = Vec::with_capacity(packages.len());
        for package in packages {
            if missing.contains(package) {
                continue;
            }
            if self.is_installed(package, env).await {
                log::info!("Gem '{}' already installed, skipping", package);
            } else {
                missing.push(package.clone());
            }
        }
        missing
    }

    fn install_command(&self, packages: &[String], user_install: bool) -> Vec<String> {
        let mut argv = vec![self.package_manager.clone(), "install".to_string()];
        if user_install {
            argv.push("--user-install".to_string());
        }
        // Names after `--` are never read as options, e.g. `--source=...`.
        argv.push("--".to_string());
        argv.extend(packages.iter().cloned());
        argv
    }
}
