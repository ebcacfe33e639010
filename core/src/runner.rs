//! Bounded execution of external diagnostic commands.
//!
//! Everything the scanners learn about the system comes from short-lived
//! child processes (`lsof`, `docker ps`). This module isolates the rest of
//! the crate from spawn failures: every invocation has a hard timeout and
//! an output cap enforced while capturing, and a child that overruns
//! either bound is killed, never left running.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::error::{Error, Result};

/// Hard ceiling on command runtime.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Hard ceiling on captured stdout (10 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Stderr is captured only for error diagnostics; anything past this is
/// discarded.
const STDERR_CAP: u64 = 8 * 1024;

/// Runs external commands with a timeout and bounded output capture.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
    max_output_bytes: usize,
    locked_locale: bool,
}

impl CommandRunner {
    /// Create a runner with the default 5s timeout and 10 MiB output cap.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            locked_locale: false,
        }
    }

    /// Force `LC_ALL=C` and `LANG=C` on spawned commands, for callers that
    /// parse locale-sensitive textual output.
    pub fn locked_locale(mut self) -> Self {
        self.locked_locale = true;
        self
    }

    /// Override the timeout (tests exercise the kill path with a short one).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the output cap.
    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }

    /// Run a command to completion and return its stdout.
    ///
    /// Fails with [`Error::CommandNotFound`] if the binary is missing,
    /// [`Error::CommandTimeout`] if the deadline passes, and
    /// [`Error::CommandFailed`] on a non-zero exit. Stdout is read
    /// incrementally with a hard length limit: the moment the cap is
    /// crossed the child is killed and [`Error::OutputTooLarge`] returned,
    /// so a runaway writer cannot balloon memory inside the timeout
    /// window. Exceeding a bound is a failure, not a partial success.
    pub async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping an in-flight child (caller cancellation, shutdown)
            // must not leave an orphan behind.
            .kill_on_drop(true);

        if self.locked_locale {
            cmd.env("LC_ALL", "C").env("LANG", "C");
        }

        debug!(program, ?args, "running command");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::CommandNotFound(program.to_string()));
            }
            Err(e) => {
                return Err(Error::CommandFailed(format!(
                    "Failed to run {}: {}",
                    program, e
                )));
            }
        };

        // One deadline covers capture and reaping.
        let deadline = Instant::now() + self.timeout;
        let timed_out = || Error::CommandTimeout {
            command: program.to_string(),
            timeout_ms: self.timeout.as_millis() as u64,
        };

        // Stderr drains on its own task so the child never blocks on a
        // full stderr pipe while stdout is being read (and vice versa:
        // stdout hitting its cap must not leave this read dangling).
        let stderr_task = child.stderr.take().map(|pipe| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = pipe.take(STDERR_CAP).read_to_end(&mut buf).await;
                buf
            })
        });

        // `take` bounds how much the pipe can ever hand us; one byte of
        // headroom distinguishes "at the cap" from "over it".
        let mut stdout_pipe = child
            .stdout
            .take()
            .map(|pipe| pipe.take(self.max_output_bytes as u64 + 1));

        let capture = timeout_at(deadline, async {
            let mut buf = Vec::new();
            if let Some(pipe) = &mut stdout_pipe {
                pipe.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        })
        .await;

        let stdout = match capture {
            Ok(Ok(buf)) => buf,
            Ok(Err(e)) => {
                let _ = child.kill().await;
                return Err(Error::CommandFailed(format!(
                    "Failed to read {} output: {}",
                    program, e
                )));
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(timed_out());
            }
        };

        if stdout.len() > self.max_output_bytes {
            let _ = child.kill().await;
            return Err(Error::OutputTooLarge {
                command: program.to_string(),
                limit: self.max_output_bytes,
            });
        }

        let status = match timeout_at(deadline, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                return Err(Error::CommandFailed(format!(
                    "Failed to reap {}: {}",
                    program, e
                )));
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(timed_out());
            }
        };

        if !status.success() {
            let stderr = match stderr_task {
                Some(task) => timeout_at(deadline, task).await.ok().and_then(|joined| joined.ok()),
                None => None,
            }
            .unwrap_or_default();
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(Error::CommandFailed(format!(
                "{} exited with {}: {}",
                program,
                status,
                stderr.trim()
            )));
        }

        String::from_utf8(stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in {} output: {}", program, e)))
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let runner = CommandRunner::new();
        let out = runner.run("echo", &["hello"]).await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn test_missing_command() {
        let runner = CommandRunner::new();
        let err = runner
            .run("definitely-not-a-real-command-xyz", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandNotFound(_)));
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let runner = CommandRunner::new();
        let err = runner.run("sh", &["-c", "exit 3"]).await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed(_)));
    }

    #[tokio::test]
    async fn test_stderr_in_failure_message() {
        let runner = CommandRunner::new();
        let err = runner
            .run("sh", &["-c", "echo boom >&2; exit 1"])
            .await
            .unwrap_err();
        match err {
            Error::CommandFailed(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let runner = CommandRunner::new().with_timeout(Duration::from_millis(100));
        let start = Instant::now();
        let err = runner.run("sleep", &["30"]).await.unwrap_err();
        assert!(matches!(err, Error::CommandTimeout { .. }));
        // Must return near the timeout bound, not after the sleep finishes.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_output_cap() {
        let runner = CommandRunner::new().with_max_output_bytes(4);
        let err = runner.run("echo", &["0123456789"]).await.unwrap_err();
        assert!(matches!(err, Error::OutputTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_cap_enforced_during_capture() {
        // A writer that never stops must hit the cap, not the timeout:
        // the capture bound applies while reading, and the child is
        // killed at the cap instead of buffering until the deadline.
        let runner = CommandRunner::new()
            .with_timeout(Duration::from_secs(30))
            .with_max_output_bytes(64 * 1024);
        let start = Instant::now();
        let err = runner.run("yes", &[]).await.unwrap_err();
        assert!(matches!(err, Error::OutputTooLarge { .. }));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_locked_locale_env() {
        let runner = CommandRunner::new().locked_locale();
        let out = runner.run("sh", &["-c", "echo $LC_ALL:$LANG"]).await.unwrap();
        assert_eq!(out.trim(), "C:C");
    }
}
