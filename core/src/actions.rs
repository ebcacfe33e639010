//! Process lifecycle actions: graceful and forceful termination.
//!
//! These are explicit user-triggered actions, so failures (no such
//! process, permission denied) are reported as values and never panic or
//! propagate across the boundary. There is no escalation automation: a
//! caller wanting "graceful then forceful" sequences the two calls itself.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of a signal delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub ok: bool,
    /// Non-empty when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionOutcome {
    fn ok() -> Self {
        Self { ok: true, error: None }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// Send a graceful termination request (SIGTERM) to a process.
pub fn terminate(pid: u32) -> ActionOutcome {
    send_signal(pid, SignalKind::Term)
}

/// Send an unconditional termination (SIGKILL) to a process.
pub fn kill(pid: u32) -> ActionOutcome {
    send_signal(pid, SignalKind::Kill)
}

#[derive(Debug, Clone, Copy)]
enum SignalKind {
    Term,
    Kill,
}

#[cfg(unix)]
fn send_signal(pid: u32, kind: SignalKind) -> ActionOutcome {
    use nix::sys::signal::{kill as nix_kill, Signal};
    use nix::unistd::Pid;

    let signal = match kind {
        SignalKind::Term => Signal::SIGTERM,
        SignalKind::Kill => Signal::SIGKILL,
    };

    if pid == 0 || pid > i32::MAX as u32 {
        // pid 0 would signal our own process group.
        return ActionOutcome::failed(format!("invalid pid: {}", pid));
    }

    debug!(pid, signal = %signal, "sending signal");
    match nix_kill(Pid::from_raw(pid as i32), signal) {
        Ok(()) => ActionOutcome::ok(),
        Err(errno) => ActionOutcome::failed(format!(
            "failed to signal pid {}: {}",
            pid,
            errno.desc()
        )),
    }
}

#[cfg(not(unix))]
fn send_signal(pid: u32, _kind: SignalKind) -> ActionOutcome {
    ActionOutcome::failed(format!(
        "signal delivery to pid {} is not supported on this platform",
        pid
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_terminate_nonexistent_pid() {
        // Near the top of the pid range; vanishingly unlikely to exist.
        let outcome = terminate(0x7fff_fff0);
        assert!(!outcome.ok);
        assert!(!outcome.error.as_deref().unwrap_or("").is_empty());
    }

    #[test]
    fn test_kill_nonexistent_pid() {
        let outcome = kill(0x7fff_fff0);
        assert!(!outcome.ok);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_invalid_pid_rejected() {
        let outcome = terminate(0);
        assert!(!outcome.ok);
    }

    #[tokio::test]
    async fn test_terminate_real_child() {
        let mut child = tokio::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();

        let outcome = terminate(pid);
        assert!(outcome.ok);
        assert!(outcome.error.is_none());

        let status = child.wait().await.unwrap();
        assert!(!status.success());
    }
}
