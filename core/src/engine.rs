//! Engine orchestrating scan, filter and reconcile cycles.
//!
//! A scheduler (timer or user action, owned by the caller) invokes
//! [`PortsEngine::refresh`]; between refreshes the presentation layer reads
//! the cached list via [`PortsEngine::ports`]. Refresh cycles never
//! overlap, and settings changes take effect on the next cycle, never
//! retroactively on an in-flight one.

use parking_lot::RwLock;
use tracing::debug;

use crate::actions::{self, ActionOutcome};
use crate::filter::is_ignored;
use crate::reconcile::{reconcile, ViewOptions};
use crate::record::PortRecord;
use crate::scanner::{DockerScanner, HostScanner, PortScan};

/// Named display toggles exposed to the settings surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayToggle {
    /// Show container-published ports.
    Docker,
    /// Show system-service ports.
    System,
}

/// Settings snapshot taken at the start of each refresh cycle.
#[derive(Debug, Clone, Default)]
struct Settings {
    ignore_rules: Vec<String>,
    view: ViewOptions,
}

/// The port discovery engine.
///
/// Generic over its two scanners so tests can inject mocks; production
/// code uses [`PortsEngine::new`] which wires up the lsof and docker
/// scanners.
pub struct PortsEngine<H: PortScan = HostScanner, D: PortScan = DockerScanner> {
    host: H,
    docker: D,

    settings: RwLock<Settings>,
    ports: RwLock<Vec<PortRecord>>,

    // Serializes refresh cycles: timer ticks and manual triggers share
    // this single-flight discipline.
    refresh_gate: tokio::sync::Mutex<()>,
}

impl PortsEngine<HostScanner, DockerScanner> {
    /// Create an engine backed by the real host and docker scanners.
    pub fn new() -> Self {
        Self::with_scanners(HostScanner::new(), DockerScanner::new())
    }
}

impl Default for PortsEngine<HostScanner, DockerScanner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: PortScan, D: PortScan> PortsEngine<H, D> {
    /// Create an engine with injected scanners.
    pub fn with_scanners(host: H, docker: D) -> Self {
        Self {
            host,
            docker,
            settings: RwLock::new(Settings::default()),
            ports: RwLock::new(Vec::new()),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Seed settings before the first cycle. The external configuration
    /// store hands these over as plain values at startup; later changes go
    /// through [`Self::update_ignore_rules`] and [`Self::set_display_toggle`].
    pub fn with_initial_settings(self, ignore_rules: Vec<String>, view: ViewOptions) -> Self {
        *self.settings.write() = Settings { ignore_rules, view };
        self
    }

    /// Run one refresh cycle and return the reconciled, filtered, ordered
    /// record list.
    ///
    /// The two scanners run concurrently; the cycle waits for both before
    /// reconciling. Each scanner's command invocation carries its own
    /// timeout, so cycle latency is bounded even when a tool hangs.
    pub async fn refresh(&self) -> Vec<PortRecord> {
        let _cycle = self.refresh_gate.lock().await;

        let settings = self.settings.read().clone();

        let (host, docker) = tokio::join!(self.host.scan(), self.docker.scan());
        debug!(
            host = host.len(),
            docker = docker.len(),
            "scan cycle complete"
        );

        let host: Vec<PortRecord> = host
            .into_iter()
            .filter(|rec| !is_ignored(rec, &settings.ignore_rules))
            .collect();
        let docker: Vec<PortRecord> = docker
            .into_iter()
            .filter(|rec| !is_ignored(rec, &settings.ignore_rules))
            .collect();

        let merged = reconcile(host, docker, &settings.view);

        *self.ports.write() = merged.clone();
        merged
    }

    /// Get the list emitted by the most recent refresh.
    pub fn ports(&self) -> Vec<PortRecord> {
        self.ports.read().clone()
    }

    /// Replace the ignore-rule set wholesale and refresh.
    pub async fn update_ignore_rules(&self, rules: Vec<String>) -> Vec<PortRecord> {
        self.settings.write().ignore_rules = rules;
        self.refresh().await
    }

    /// Current ignore rules.
    pub fn ignore_rules(&self) -> Vec<String> {
        self.settings.read().ignore_rules.clone()
    }

    /// Flip a display toggle and refresh.
    pub async fn set_display_toggle(&self, toggle: DisplayToggle, on: bool) -> Vec<PortRecord> {
        {
            let mut settings = self.settings.write();
            match toggle {
                DisplayToggle::Docker => settings.view.show_docker = on,
                DisplayToggle::System => settings.view.show_system = on,
            }
        }
        self.refresh().await
    }

    /// Current display toggles.
    pub fn view_options(&self) -> ViewOptions {
        self.settings.read().view
    }

    /// Request graceful termination of a process.
    pub fn terminate_process(&self, pid: u32) -> ActionOutcome {
        actions::terminate(pid)
    }

    /// Forcefully kill a process.
    pub fn kill_process(&self, pid: u32) -> ActionOutcome {
        actions::kill(pid)
    }
}
