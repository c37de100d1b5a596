//! Local (host) executor: install gems, then run the snippet with `ruby`.

use async_trait::async_trait;

use super::environment::ExecutionEnvironment;
use super::installer::DependencyInstaller;
use super::runner::CommandRunner;
use super::workspace::EphemeralWorkspace;
use super::{CodeExecutor, CommandResult, ExecutionRequest};
use crate::config::ExecConfig;
use crate::errors::ExecError;

pub struct LocalCodeExecutor {
    config: ExecConfig,
    runner: CommandRunner,
    installer: DependencyInstaller,
}

impl LocalCodeExecutor {
    pub fn new(config: ExecConfig) -> Result<Self, ExecError> {
        config.validate()?;
        let runner = CommandRunner::new(config.timeout_duration());
        let installer = DependencyInstaller::new(config.package_manager.clone(), runner.clone());
        Ok(Self {
            config,
            runner,
            installer,
        })
    }

    /// Convenience entry point taking plain parameters.
    pub async fn execute(
        &self,
        code: &str,
        packages: Option<&[String]>,
        isolated: bool,
    ) -> Result<CommandResult, ExecError> {
        let request = ExecutionRequest {
            code: code.to_string(),
            packages: packages.map(<[String]>::to_vec).unwrap_or_default(),
            isolated,
        };
        self.execute_code(&request).await
    }

    async fn run_shared(&self, request: &ExecutionRequest) -> Result<CommandResult, ExecError> {
        let install_dir = self.config.resolve_shared_install_dir()?;
        let env = self.base_env().into_shared(&install_dir);

        let packages = if self.config.skip_installed {
            self.installer.filter_installed(&request.packages, Some(&env)).await
        } else {
            request.packages.clone()
        };

        if let Err(failure) = self.install(&packages, &env).await {
            return Ok(failure);
        }

        let argv = vec![
            self.config.interpreter.clone(),
            "-e".to_string(),
            request.code.clone(),
        ];
        Ok(self.runner.run(&argv, Some(&env)).await)
    }

    async fn run_isolated(&self, request: &ExecutionRequest) -> Result<CommandResult, ExecError> {
        let workspace = EphemeralWorkspace::create(&self.config.workspace_prefix)?;
        let outcome = self.run_in_workspace(&workspace, request).await;
        workspace.dispose();
        outcome
    }

    async fn run_in_workspace(
        &self,
        workspace: &EphemeralWorkspace,
        request: &ExecutionRequest,
    ) -> Result<CommandResult, ExecError> {
        let env = self.base_env().into_isolated(&workspace.gem_home());

        // The store is empty, so every requested gem is installed.
        if let Err(failure) = self.install(&request.packages, &env).await {
            return Ok(failure);
        }

        let script = workspace
            .write_script(&self.config.script_name, &request.code)
            .await?;
        let argv = vec![
            self.config.interpreter.clone(),
            script.display().to_string(),
        ];
        Ok(self.runner.run(&argv, Some(&env)).await)
    }

    async fn install(
        &self,
        packages: &[String],
        env: &ExecutionEnvironment,
    ) -> Result<(), CommandResult> {
        let result = self.installer.install(packages, Some(env)).await;
        if result.is_success() {
            Ok(())
        } else {
            log::warn!("Dependency install failed, skipping execution");
            Err(CommandResult::install_failure(result))
        }
    }

    /// Host environment plus configured extras; the strategy's gem
    /// variables are applied on top of this.
    fn base_env(&self) -> ExecutionEnvironment {
        ExecutionEnvironment::from_host().merge(&self.config.environment.variables)
    }
}

#[async_trait]
impl CodeExecutor for LocalCodeExecutor {
    async fn execute_code(&self, request: &ExecutionRequest) -> Result<CommandResult, ExecError> {
        let isolated = request.isolated || self.config.always_isolated;
        log::info!(
            "Executing Ruby snippet ({} bytes, {} gem(s), {} mode)",
            request.code.len(),
            request.packages.len(),
            if isolated { "isolated" } else { "shared" }
        );

        let result = if isolated {
            self.run_isolated(request).await?
        } else {
            self.run_shared(request).await?
        };

        log::info!("Execution finished with return code {}", result.returncode);
        Ok(result)
    }
}
