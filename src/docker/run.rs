use std::io::BufRead;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::warn;

use super::types::{CancelToken, CommandResult, DockerCommand, OutputLine};
use crate::error::EngineError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Spawn `program` with the command's arguments and stream its output.
///
/// The caller receives [`OutputLine::Stdout`]/[`Stderr`] as they arrive,
/// followed by exactly one [`OutputLine::Done`] carrying the final result.
pub fn spawn(
    program: &str,
    cmd: DockerCommand,
    cancel: CancelToken,
) -> Result<Receiver<OutputLine>, EngineError> {
    let mut child = Command::new(program)
        .args(&cmd.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(EngineError::other("child output was not captured"));
    };

    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        orchestrate(child, stdout, stderr, tx, cancel, cmd.timeout);
    });

    Ok(rx)
}

/// Run a command to completion, handing every output line to `on_line`.
pub fn execute(
    program: &str,
    cmd: DockerCommand,
    cancel: &CancelToken,
    mut on_line: impl FnMut(&str),
) -> Result<CommandResult, EngineError> {
    let verb = cmd.verb().to_string();
    let rx = spawn(program, cmd, cancel.clone())?;

    for line in rx {
        match line {
            OutputLine::Stdout(l) | OutputLine::Stderr(l) => on_line(&l),
            OutputLine::Done(result) => {
                if result.cancelled {
                    warn!(%verb, "engine command cancelled");
                } else if result.timed_out {
                    warn!(%verb, "engine command timed out");
                }
                return Ok(result);
            }
        }
    }

    Err(EngineError::other(format!(
        "{verb}: output stream closed without a result"
    )))
}

fn forward_lines<R: std::io::Read + Send + 'static>(
    reader: R,
    buf: Arc<Mutex<String>>,
    tx: Sender<OutputLine>,
    wrap: fn(String) -> OutputLine,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let reader = std::io::BufReader::new(reader);
        for line in reader.lines() {
            match line {
                Ok(l) => {
                    if let Ok(mut buf) = buf.lock() {
                        buf.push_str(&l);
                        buf.push('\n');
                    }
                    // Receiver may be dropped; ignore send errors.
                    let _ = tx.send(wrap(l));
                }
                Err(_) => break,
            }
        }
    })
}

fn orchestrate(
    mut child: std::process::Child,
    stdout: std::process::ChildStdout,
    stderr: std::process::ChildStderr,
    tx: Sender<OutputLine>,
    cancel: CancelToken,
    timeout: Duration,
) {
    let out_buf = Arc::new(Mutex::new(String::new()));
    let err_buf = Arc::new(Mutex::new(String::new()));

    // --- reader threads ---------------------------------------------------
    let stdout_handle = forward_lines(stdout, out_buf.clone(), tx.clone(), OutputLine::Stdout);
    let stderr_handle = forward_lines(stderr, err_buf.clone(), tx.clone(), OutputLine::Stderr);

    // --- poll loop ---------------------------------------------------------
    let start = Instant::now();
    let mut cancelled = false;
    let mut timed_out = false;

    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {}
            Err(_) => break None,
        }

        if cancel.is_cancelled() {
            cancelled = true;
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }

        if start.elapsed() > timeout {
            timed_out = true;
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }

        std::thread::sleep(POLL_INTERVAL);
    };

    // --- finalize ----------------------------------------------------------
    let _ = stdout_handle.join();
    let _ = stderr_handle.join();

    let exit_code = exit_status.and_then(|s| s.code());
    let take = |buf: &Arc<Mutex<String>>| buf.lock().map(|b| b.clone()).unwrap_or_default();

    let _ = tx.send(OutputLine::Done(CommandResult {
        success: exit_code == Some(0),
        exit_code,
        stdout: take(&out_buf),
        stderr: take(&err_buf),
        cancelled,
        timed_out,
    }));
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> DockerCommand {
        DockerCommand::new(["-c", script], timeout)
    }

    #[test]
    fn captures_stdout_and_stderr_separately() {
        let mut seen = Vec::new();
        let result = execute(
            "sh",
            sh("echo out; echo err >&2", Duration::from_secs(10)),
            &CancelToken::new(),
            |l| seen.push(l.to_string()),
        )
        .unwrap();

        assert!(result.success);
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn non_zero_exit_is_not_success() {
        let result = execute(
            "sh",
            sh("exit 3", Duration::from_secs(10)),
            &CancelToken::new(),
            |_| {},
        )
        .unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn timeout_kills_child() {
        let result = execute(
            "sh",
            sh("exec sleep 5", Duration::from_millis(200)),
            &CancelToken::new(),
            |_| {},
        )
        .unwrap();
        assert!(result.timed_out);
        assert!(!result.success);
    }

    #[test]
    fn pre_cancelled_token_kills_child() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = execute("sh", sh("exec sleep 5", Duration::from_secs(10)), &cancel, |_| {})
            .unwrap();
        assert!(result.cancelled);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = execute(
            "definitely-not-a-real-binary-xyz",
            DockerCommand::new(["version"], Duration::from_secs(1)),
            &CancelToken::new(),
            |_| {},
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Spawn(_)));
    }
}
