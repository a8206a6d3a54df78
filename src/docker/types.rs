use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::EngineError;

/// Cooperative cancellation token backed by an `AtomicBool`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One engine CLI invocation. `args` excludes the program name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerCommand {
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl DockerCommand {
    pub fn new<I, S>(args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            timeout,
        }
    }

    /// Subcommand name, for logging.
    pub fn verb(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }
}

/// Outcome of a finished invocation.
#[derive(Debug, Default)]
pub struct CommandResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub cancelled: bool,
    pub timed_out: bool,
}

impl CommandResult {
    /// Stdout on success, otherwise the reason the command failed.
    pub fn into_stdout(self) -> Result<String, EngineError> {
        if self.cancelled {
            return Err(EngineError::Cancelled);
        }
        if self.timed_out {
            return Err(EngineError::TimedOut);
        }
        if !self.success {
            return Err(EngineError::Exit {
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            });
        }
        Ok(self.stdout)
    }
}

/// Streamed output from a running command.
#[derive(Debug)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
    Done(CommandResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_starts_uncancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_token_transitions_once() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_token_is_visible_across_clones() {
        let a = CancelToken::new();
        let b = a.clone();
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn successful_result_yields_stdout() {
        let result = CommandResult {
            success: true,
            exit_code: Some(0),
            stdout: "abc123\n".into(),
            ..CommandResult::default()
        };
        assert_eq!(result.into_stdout().unwrap(), "abc123\n");
    }

    #[test]
    fn failed_result_carries_trimmed_stderr() {
        let result = CommandResult {
            exit_code: Some(1),
            stderr: "Error: No such container: x\n".into(),
            ..CommandResult::default()
        };
        match result.into_stdout() {
            Err(EngineError::Exit { code, stderr }) => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "Error: No such container: x");
            }
            other => panic!("expected Exit, got: {other:?}"),
        }
    }

    #[test]
    fn cancellation_wins_over_exit_status() {
        let result = CommandResult {
            cancelled: true,
            exit_code: None,
            ..CommandResult::default()
        };
        assert!(matches!(result.into_stdout(), Err(EngineError::Cancelled)));

        let result = CommandResult {
            timed_out: true,
            ..CommandResult::default()
        };
        assert!(matches!(result.into_stdout(), Err(EngineError::TimedOut)));
    }

    #[test]
    fn verb_is_first_argument() {
        let cmd = DockerCommand::new(["pull", "mysql:5.7"], Duration::from_secs(1));
        assert_eq!(cmd.verb(), "pull");
        assert_eq!(DockerCommand::new(Vec::<String>::new(), Duration::ZERO).verb(), "");
    }
}
