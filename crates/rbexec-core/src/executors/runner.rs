//! Bounded subprocess invocation.
//!
//! One call spawns exactly one process. The child gets no stdin, both output
//! streams are captured, and a hard wall-clock limit applies. Nothing is
//! retried.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

use super::environment::ExecutionEnvironment;
use super::CommandResult;

#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `argv` to completion or until the timeout fires.
    ///
    /// With `env` the child sees exactly those variables; without it the child
    /// inherits the host environment.
    pub async fn run(&self, argv: &[String], env: Option<&ExecutionEnvironment>) -> CommandResult {
        let Some((program, args)) = argv.split_first() else {
            return CommandResult::launch_failure("<empty>", "no command given");
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(env) = env {
            cmd.env_clear();
            cmd.envs(env.iter());
        }

        log::debug!("Spawning {:?} (timeout {:?})", argv, self.timeout);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                log::warn!("Failed to launch {}: {}", program, e);
                return CommandResult::launch_failure(program, &e.to_string());
            }
        };

        // Dropping the wait future on timeout drops the child, which kills it.
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => CommandResult {
                returncode: exit_code(output.status),
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            },
            Ok(Err(e)) => {
                log::warn!("Failed to collect output of {}: {}", program, e);
                CommandResult::launch_failure(program, &e.to_string())
            }
            Err(_) => {
                log::warn!("Execution of {} timed out after {:?}", program, self.timeout);
                CommandResult::timed_out()
            }
        }
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(CommandResult::LAUNCH_FAILED)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(CommandResult::LAUNCH_FAILED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::TIMEOUT_MESSAGE;
    use serial_test::serial;
    use std::time::Instant;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    #[serial]
    async fn test_captures_and_trims_output() {
        let runner = CommandRunner::new(Duration::from_secs(10));
        let result = runner.run(&sh("echo '  hello  '; echo ' oops ' >&2"), None).await;

        assert_eq!(result.returncode, 0);
        assert_eq!(result.stdout, "hello");
        assert_eq!(result.stderr, "oops");
    }

    #[tokio::test]
    #[serial]
    async fn test_passes_exit_code_through() {
        let runner = CommandRunner::new(Duration::from_secs(10));
        let result = runner.run(&sh("echo partial; exit 3"), None).await;

        assert_eq!(result.returncode, 3);
        assert_eq!(result.stdout, "partial");
    }

    #[tokio::test]
    #[serial]
    async fn test_timeout_yields_sentinel() {
        let runner = CommandRunner::new(Duration::from_millis(300));
        let started = Instant::now();
        let result = runner.run(&sh("echo before; exec sleep 5"), None).await;

        assert_eq!(result.returncode, -2);
        assert_eq!(result.stdout, "");
        assert_eq!(result.stderr, TIMEOUT_MESSAGE);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    #[serial]
    async fn test_explicit_env_replaces_host() {
        let runner = CommandRunner::new(Duration::from_secs(10));
        let env = ExecutionEnvironment::from_host()
            .with_var("RBEXEC_MARKER", "isolated-value");
        let result = runner.run(&sh("printf '%s' \"$RBEXEC_MARKER\""), Some(&env)).await;
        assert_eq!(result.stdout, "isolated-value");

        let sparse = ExecutionEnvironment::empty()
            .with_var("PATH", std::env::var("PATH").unwrap_or_default());
        let result = runner.run(&sh("printf '%s' \"${HOME:-unset}\""), Some(&sparse)).await;
        assert_eq!(result.stdout, "unset");
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_binary_is_reported_as_data() {
        let runner = CommandRunner::new(Duration::from_secs(10));
        let argv = vec!["definitely-not-a-real-binary-xyz".to_string()];
        let result = runner.run(&argv, None).await;

        assert_eq!(result.returncode, CommandResult::LAUNCH_FAILED);
        assert!(result.stderr.contains("definitely-not-a-real-binary-xyz"));
    }

    #[tokio::test]
    #[serial]
    async fn test_empty_argv() {
        let runner = CommandRunner::new(Duration::from_secs(1));
        let result = runner.run(&[], None).await;
        assert_eq!(result.returncode, CommandResult::LAUNCH_FAILED);
    }

    #[tokio::test]
    #[serial]
    async fn test_stdin_is_closed() {
        let runner = CommandRunner::new(Duration::from_secs(5));
        let result = runner.run(&sh("cat; echo done"), None).await;
        assert_eq!(result.returncode, 0);
        assert_eq!(result.stdout, "done");
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_non_utf8_host_value_reaches_child() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        std::env::set_var("RBEXEC_LATIN1_VALUE", OsStr::from_bytes(b"caf\xe9"));
        let env = ExecutionEnvironment::from_host();
        std::env::remove_var("RBEXEC_LATIN1_VALUE");

        let runner = CommandRunner::new(Duration::from_secs(10));
        let result = runner
            .run(&sh("printf '%s' \"$RBEXEC_LATIN1_VALUE\" | od -An -tx1"), Some(&env))
            .await;

        assert_eq!(result.returncode, 0);
        let bytes: Vec<&str> = result.stdout.split_whitespace().collect();
        assert_eq!(bytes, vec!["63", "61", "66", "e9"]);
    }
}
