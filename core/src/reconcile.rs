//! Merging host and container record sets into one consistent view.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::is_system_process;
use crate::record::PortRecord;

/// Processes the container runtime creates purely to relay host-side
/// connections into a container. A published port shows up twice: once in
/// `docker ps` and once in the host scan under one of these names. The
/// container record carries more context, so the helper is the one dropped.
const FORWARD_HELPERS: &[&str] = &["limactl", "docker-proxy", "com.docker.backend"];

/// Display toggles, snapshotted per refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOptions {
    /// Include container-sourced records in the merged view.
    pub show_docker: bool,
    /// Include host records whose command classifies as a system service.
    pub show_system: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            show_docker: true,
            show_system: true,
        }
    }
}

/// Merge host and container records into one ordered, deduplicated list.
///
/// A pure function of the two collected sequences plus a config snapshot:
/// it never calls the scanners, so it can be tested in isolation. A host
/// record is dropped only when its port matches a retained container
/// record's host port AND its command is a known port-forwarding helper;
/// any other host record on a container's port is kept, surfacing the
/// ambiguity to the user rather than hiding it.
///
/// The result is sorted by `(source name, port)`, so ordering is stable
/// across refreshes regardless of OS listing order.
pub fn reconcile(
    host: Vec<PortRecord>,
    docker: Vec<PortRecord>,
    options: &ViewOptions,
) -> Vec<PortRecord> {
    let docker: Vec<PortRecord> = if options.show_docker {
        docker
    } else {
        Vec::new()
    };

    let host = host.into_iter().filter(|rec| {
        options.show_system || !is_system_process(&rec.command)
    });

    let docker_ports: HashSet<u16> = docker.iter().map(|rec| rec.port).collect();

    let mut merged: Vec<PortRecord> = host
        .filter(|rec| {
            if !docker_ports.contains(&rec.port) {
                return true;
            }
            if FORWARD_HELPERS.contains(&rec.command.as_str()) {
                debug!(port = rec.port, command = %rec.command, "dropping forwarding helper");
                return false;
            }
            true
        })
        .collect();

    merged.extend(docker);
    merged.sort_by(|a, b| {
        (a.source.as_str(), a.port).cmp(&(b.source.as_str(), b.port))
    });
    merged
}
