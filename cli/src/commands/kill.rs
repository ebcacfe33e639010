//! Kill command - send a termination signal to a process.

use anyhow::{bail, Result};

pub fn run(pid: u32, force: bool) -> Result<()> {
    let outcome = if force {
        openports_core::kill(pid)
    } else {
        openports_core::terminate(pid)
    };

    if outcome.ok {
        let signal = if force { "SIGKILL" } else { "SIGTERM" };
        println!("Sent {} to pid {}", signal, pid);
        Ok(())
    } else {
        bail!(
            "{}",
            outcome.error.unwrap_or_else(|| "signal delivery failed".into())
        )
    }
}
