//! Host socket scanner built on lsof's machine-parseable field output.

use std::collections::HashSet;

use tracing::debug;

use crate::record::{PortRecord, Protocol};
use crate::runner::CommandRunner;

use super::PortScan;

/// Scans listening TCP sockets on the host.
///
/// Runs lsof in field mode (`-F`) and parses its single-character-tagged
/// lines. Output is deduplicated so a process listening on the same port
/// over both IPv4 and IPv6 yields one record.
pub struct HostScanner {
    runner: CommandRunner,
}

/// Accumulator for the process whose field lines are currently being read.
///
/// lsof groups output by process: a `p` line starts a new process record,
/// `c`/`P`/`u` lines update it, and each `n` line names one connection of
/// that process. Reset wholesale on every `p` line.
#[derive(Default)]
struct ProcessContext {
    pid: Option<u32>,
    command: Option<String>,
    protocol: Protocol,
    user: Option<String>,
}

impl HostScanner {
    /// Create a host scanner with locale-locked command execution, so
    /// lsof's textual output is stable regardless of the user's locale.
    pub fn new() -> Self {
        Self {
            runner: CommandRunner::new().locked_locale(),
        }
    }

    /// Create a host scanner with a custom runner (tests shorten timeouts).
    pub fn with_runner(runner: CommandRunner) -> Self {
        Self {
            runner: runner.locked_locale(),
        }
    }

    /// Parse lsof `-F pcPun` output into port records.
    ///
    /// Expected shape:
    /// ```text
    /// p34805
    /// cnode
    /// u501
    /// PTCP
    /// n[::1]:3000 (LISTEN)
    /// n127.0.0.1:3000 (LISTEN)
    /// ```
    fn parse_field_output(output: &str) -> Vec<PortRecord> {
        let mut records = Vec::new();
        let mut seen: HashSet<(u32, u16)> = HashSet::new();
        let mut cur = ProcessContext::default();

        for line in output.lines() {
            let mut chars = line.chars();
            let Some(tag) = chars.next() else {
                continue;
            };
            let value = chars.as_str();

            match tag {
                'p' => {
                    // New process record; a malformed pid leaves the
                    // context pid-less and its connection lines skipped.
                    cur = ProcessContext {
                        pid: value.parse().ok(),
                        ..ProcessContext::default()
                    };
                }
                'c' => cur.command = Some(value.to_string()),
                'P' => cur.protocol = Protocol::parse(value),
                'u' => cur.user = Some(value.to_string()),
                'n' => {
                    // One connection of the current process. Without a pid
                    // from context there is nothing to attach it to.
                    let Some(pid) = cur.pid else {
                        continue;
                    };
                    let name = value.strip_suffix(" (LISTEN)").unwrap_or(value);
                    if name.is_empty() {
                        continue;
                    }
                    let Some(port) = trailing_port(name) else {
                        continue;
                    };
                    if !seen.insert((pid, port)) {
                        continue;
                    }
                    records.push(PortRecord::host(
                        port,
                        cur.protocol,
                        pid,
                        cur.command.clone(),
                        name,
                        cur.user.clone(),
                    ));
                }
                _ => {}
            }
        }

        records
    }
}

/// Extract the trailing `:port` from a connection name.
///
/// Accepts `127.0.0.1:3000`, `*:5173` and bracketed IPv6 like `[::1]:3000`;
/// the characters after the last colon must all be digits, which naturally
/// rejects bare IPv6 addresses without a port.
fn trailing_port(name: &str) -> Option<u16> {
    let idx = name.rfind(':')?;
    let digits = &name[idx + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match digits.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

impl Default for HostScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PortScan for HostScanner {
    /// Scan listening TCP sockets using lsof.
    ///
    /// Executes: `lsof -nP -iTCP -sTCP:LISTEN -F pcPun`
    ///
    /// Flags explained:
    /// - -n / -P: no host or port name resolution
    /// - -iTCP -sTCP:LISTEN: TCP sockets in LISTEN state only
    /// - -F pcPun: field mode with pid, command, protocol, user, name
    async fn scan(&self) -> Vec<PortRecord> {
        match self
            .runner
            .run("lsof", &["-nP", "-iTCP", "-sTCP:LISTEN", "-F", "pcPun"])
            .await
        {
            Ok(stdout) => Self::parse_field_output(&stdout),
            Err(e) => {
                // lsof missing, unauthorized or timed out; absence of the
                // capability is not fatal to the caller.
                debug!(error = %e, "host socket scan unavailable");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PortSource, UNKNOWN_COMMAND};

    #[test]
    fn test_parse_single_process() {
        let output = "p42\ncnode\nu501\nPTCP\nn*:3000 (LISTEN)\n";
        let records = HostScanner::parse_field_output(output);
        assert_eq!(records.len(), 1);

        let rec = &records[0];
        assert_eq!(rec.source, PortSource::Host);
        assert_eq!(rec.pid, Some(42));
        assert_eq!(rec.command, "node");
        assert_eq!(rec.port, 3000);
        assert_eq!(rec.protocol, Protocol::Tcp);
        assert_eq!(rec.raw_address, "*:3000");
        assert_eq!(rec.user.as_deref(), Some("501"));
    }

    #[test]
    fn test_dual_stack_dedup() {
        let output = "p42\ncnode\nPTCP\nn127.0.0.1:3000 (LISTEN)\nn[::1]:3000 (LISTEN)\n";
        let records = HostScanner::parse_field_output(output);
        // IPv4 and IPv6 listeners for the same (pid, port) collapse,
        // keeping the first occurrence.
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_multiple_processes() {
        let output = "p1\ncnginx\nPTCP\nn*:80 (LISTEN)\np42\ncnode\nPTCP\nn[::1]:3000 (LISTEN)\n";
        let records = HostScanner::parse_field_output(output);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].command, "nginx");
        assert_eq!(records[0].port, 80);
        assert_eq!(records[1].command, "node");
        assert_eq!(records[1].port, 3000);
    }

    #[test]
    fn test_connection_without_process_skipped() {
        // Malformed output: connection lines before any process line must
        // not fabricate a pid.
        let output = "n*:8080 (LISTEN)\nPTCP\nn127.0.0.1:9090 (LISTEN)\n";
        let records = HostScanner::parse_field_output(output);
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_command_falls_back() {
        let output = "p7\nn*:53 (LISTEN)\n";
        let records = HostScanner::parse_field_output(output);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].command, UNKNOWN_COMMAND);
    }

    #[test]
    fn test_unparseable_port_skipped() {
        let output = "p7\ncfoo\nn*:not-a-port\nnno-colon-at-all\nn[::1]\n";
        let records = HostScanner::parse_field_output(output);
        assert!(records.is_empty());
    }

    #[test]
    fn test_context_resets_between_processes() {
        // Second process has no command line; it must not inherit the
        // first process's name.
        let output = "p1\ncnginx\nn*:80 (LISTEN)\np2\nn*:81 (LISTEN)\n";
        let records = HostScanner::parse_field_output(output);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].command, UNKNOWN_COMMAND);
    }

    #[test]
    fn test_trailing_port() {
        assert_eq!(trailing_port("127.0.0.1:3000"), Some(3000));
        assert_eq!(trailing_port("*:5173"), Some(5173));
        assert_eq!(trailing_port("[::1]:3000"), Some(3000));
        assert_eq!(trailing_port("[fe80::1]:8080"), Some(8080));
        assert_eq!(trailing_port("[::1]"), None);
        assert_eq!(trailing_port("*:0"), None);
        assert_eq!(trailing_port("*:99999"), None);
        assert_eq!(trailing_port("no-port"), None);
    }
}
