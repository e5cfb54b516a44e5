//! Gateway that applies a strategy by running an external command.
//!
//! The command receives the strategy id both as a substituted argument
//! (`{strategy}` placeholders) and in the `FAILOVER_STRATEGY` environment
//! variable. Exit status 0 means the strategy is live.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time;

use crate::config::GatewayConfig;
use crate::failover::types::StrategyId;
use crate::gateway::{ActivationError, ActivationGateway};

const PLACEHOLDER: &str = "{strategy}";

/// Longest stderr excerpt kept in an error.
const STDERR_LIMIT: usize = 512;

#[derive(Debug, Clone)]
pub struct CommandGateway {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandGateway {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn render_args(&self, strategy: &StrategyId) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(PLACEHOLDER, strategy.as_str()))
            .collect()
    }
}

#[async_trait]
impl ActivationGateway for CommandGateway {
    async fn activate(&self, strategy: &StrategyId) -> Result<(), ActivationError> {
        let mut command = Command::new(&self.program);
        command
            .args(self.render_args(strategy))
            .env("FAILOVER_STRATEGY", strategy.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(program = %self.program, strategy_id = %strategy, "Running apply command");

        let output = match time::timeout(self.timeout, command.output()).await {
            Ok(result) => result?,
            Err(_) => return Err(ActivationError::Timeout(self.timeout.as_secs())),
        };

        if output.status.success() {
            return Ok(());
        }

        let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.len() > STDERR_LIMIT {
            let mut cut = STDERR_LIMIT;
            while !stderr.is_char_boundary(cut) {
                cut -= 1;
            }
            stderr.truncate(cut);
        }
        Err(ActivationError::CommandFailed {
            code: output.status.code(),
            stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> CommandGateway {
        CommandGateway::new("sh", vec!["-c".into(), script.into()], timeout)
    }

    #[test]
    fn test_render_args() {
        let gw = CommandGateway::new(
            "apply",
            vec!["--profile".into(), "{strategy}.toml".into()],
            Duration::from_secs(1),
        );
        assert_eq!(
            gw.render_args(&"youtube-split".into()),
            vec!["--profile".to_string(), "youtube-split.toml".to_string()]
        );
    }

    #[tokio::test]
    async fn test_success_exit() {
        let gw = sh("test \"$FAILOVER_STRATEGY\" = b", Duration::from_secs(5));
        assert!(gw.activate(&"b".into()).await.is_ok());
    }

    #[tokio::test]
    async fn test_failure_exit_carries_stderr() {
        let gw = sh("echo bad profile >&2; exit 3", Duration::from_secs(5));
        match gw.activate(&"b".into()).await {
            Err(ActivationError::CommandFailed { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "bad profile");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let gw = sh("sleep 5", Duration::from_millis(100));
        assert!(matches!(
            gw.activate(&"b".into()).await,
            Err(ActivationError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let gw = CommandGateway::new("/nonexistent/apply-strategy", vec![], Duration::from_secs(1));
        assert!(matches!(
            gw.activate(&"b".into()).await,
            Err(ActivationError::Io(_))
        ));
    }
}
