//! Container port scanner built on `docker ps` formatted output.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::record::{PortRecord, Protocol};
use crate::runner::CommandRunner;

use super::PortScan;

/// Scans published container ports via the docker CLI.
///
/// There is no direct container-to-PID mapping here; records carry the
/// container id and name instead, and the reconciliation stage removes
/// the runtime's own forwarding processes from the host scan.
pub struct DockerScanner {
    runner: CommandRunner,
}

impl DockerScanner {
    pub fn new() -> Self {
        Self {
            runner: CommandRunner::new(),
        }
    }

    /// Create a docker scanner with a custom runner (tests shorten timeouts).
    pub fn with_runner(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// Parse pipe-delimited `id|name|ports` lines into port records.
    ///
    /// The ports column looks like:
    /// ```text
    /// 0.0.0.0:8080->80/tcp, :::8080->80/tcp
    /// ```
    /// Only publish clauses with a host binding match; internal-only ports
    /// (`6379/tcp` with no `->`) are skipped.
    fn parse_ps_output(output: &str) -> Vec<PortRecord> {
        let publish = publish_pattern();
        let mut records = Vec::new();

        for line in output.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.splitn(3, '|');
            let (Some(id), Some(name), Some(ports)) =
                (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            if ports.is_empty() {
                continue;
            }

            for clause in ports.split(',') {
                let Some(caps) = publish.captures(clause.trim()) else {
                    continue;
                };
                let (Ok(host_port), Ok(container_port)) =
                    (caps[1].parse::<u16>(), caps[2].parse::<u16>())
                else {
                    continue;
                };
                records.push(PortRecord::docker(
                    host_port,
                    container_port,
                    Protocol::parse(&caps[3]),
                    id,
                    name,
                ));
            }
        }

        records
    }
}

/// Publish-clause pattern, compiled once for the lifetime of the process.
/// Bind address is one of the all-interfaces forms docker prints.
fn publish_pattern() -> &'static Regex {
    static PUBLISH: OnceLock<Regex> = OnceLock::new();
    PUBLISH.get_or_init(|| {
        Regex::new(r"(?i)(?:0\.0\.0\.0|\*|::):(\d+)->(\d+)/(tcp|udp)")
            .expect("publish pattern is valid")
    })
}

impl Default for DockerScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PortScan for DockerScanner {
    /// Scan published container ports.
    ///
    /// Executes: `docker ps --format {{.ID}}|{{.Names}}|{{.Ports}}`
    async fn scan(&self) -> Vec<PortRecord> {
        match self
            .runner
            .run("docker", &["ps", "--format", "{{.ID}}|{{.Names}}|{{.Ports}}"])
            .await
        {
            Ok(stdout) => Self::parse_ps_output(&stdout),
            Err(e) => {
                // Docker not installed or daemon not running.
                debug!(error = %e, "container port scan unavailable");
                Vec::new()
            }
        }
    }
}
