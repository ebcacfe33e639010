//! Port record data structures.

use serde::{Deserialize, Serialize};

/// Placeholder command name used when the owning process name is unknown.
pub const UNKNOWN_COMMAND: &str = "(unknown)";

/// Where a port record was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PortSource {
    /// A listening socket reported by the host's socket enumeration tool.
    Host,
    /// A published port reported by the container runtime.
    Docker,
}

impl PortSource {
    /// Stable lower-case name, also the primary sort key for reconciled
    /// output ("docker" sorts before "host").
    pub fn as_str(&self) -> &'static str {
        match self {
            PortSource::Host => "host",
            PortSource::Docker => "docker",
        }
    }
}

impl std::fmt::Display for PortSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport protocol of a listening port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    /// Parse a protocol token, case-insensitively. Anything that is not
    /// recognizably UDP is treated as TCP.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("udp") {
            Protocol::Udp
        } else {
            Protocol::Tcp
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed listening port, attributed to a process or a container.
///
/// A full set of records is produced fresh on every refresh cycle. Identity
/// for deduplication purposes is `(source, port, pid-or-container_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRecord {
    /// Which scanner produced this record.
    pub source: PortSource,

    /// The host-visible listening port.
    pub port: u16,

    /// Transport protocol, lower-cased on the wire.
    pub protocol: Protocol,

    /// Owning process id. Present for host records with a known owner,
    /// always absent for docker records (the runtime's listing has no
    /// direct PID correlation).
    pub pid: Option<u32>,

    /// Display name of the owning process, or `docker:<container-name>`.
    /// Never empty; falls back to [`UNKNOWN_COMMAND`].
    pub command: String,

    /// Container id, docker records only.
    pub container_id: Option<String>,

    /// Container name, docker records only.
    pub container_name: Option<String>,

    /// The original address:port string as reported, e.g. `127.0.0.1:3000`
    /// or `[::1]:3000`. Kept for diagnostics and ignore-rule matching.
    pub raw_address: String,

    /// Owning user, host records only.
    pub user: Option<String>,
}

impl PortRecord {
    /// Create a host-sourced record from scan context.
    pub fn host(
        port: u16,
        protocol: Protocol,
        pid: u32,
        command: Option<String>,
        raw_address: impl Into<String>,
        user: Option<String>,
    ) -> Self {
        let command = match command {
            Some(c) if !c.is_empty() => c,
            _ => UNKNOWN_COMMAND.to_string(),
        };
        Self {
            source: PortSource::Host,
            port,
            protocol,
            pid: Some(pid),
            command,
            container_id: None,
            container_name: None,
            raw_address: raw_address.into(),
            user,
        }
    }

    /// Create a docker-sourced record for a published port.
    ///
    /// The command is synthesized as `docker:<name>` and the raw address
    /// records the container-side mapping (`<name>:<containerPort>`).
    pub fn docker(
        host_port: u16,
        container_port: u16,
        protocol: Protocol,
        container_id: impl Into<String>,
        container_name: impl Into<String>,
    ) -> Self {
        let name = container_name.into();
        Self {
            source: PortSource::Docker,
            port: host_port,
            protocol,
            pid: None,
            command: format!("docker:{}", name),
            container_id: Some(container_id.into()),
            raw_address: format!("{}:{}", name, container_port),
            container_name: Some(name),
            user: None,
        }
    }
}

impl std::fmt::Display for PortRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} {} ({})",
            self.port, self.protocol, self.command, self.source
        )
    }
}
