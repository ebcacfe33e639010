//! Port scanners for the host and the container runtime.

mod docker;
mod host;

pub use docker::DockerScanner;
pub use host::HostScanner;

use crate::record::PortRecord;

/// Trait for port scanning implementations.
///
/// Scanning is best-effort: a missing tool, a timeout or unparseable
/// output all degrade to an empty record set. Implementations never fail
/// outward, which is why the output is a plain `Vec` and not a `Result`.
pub trait PortScan: Send + Sync {
    /// Collect the current set of port records for this source.
    fn scan(&self) -> impl std::future::Future<Output = Vec<PortRecord>> + Send;
}
