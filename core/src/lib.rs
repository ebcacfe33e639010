//! OpenPorts Core Library
//!
//! Port discovery and reconciliation engine. Provides functionality to:
//! - Scan listening TCP sockets on the host (lsof field output)
//! - Scan published container ports (docker ps)
//! - Merge both sets, dropping the runtime's port-forwarding helpers
//! - Filter records with user-supplied ignore rules
//! - Terminate processes (gracefully or forcefully)
//!
//! # Architecture
//! - `runner`: bounded execution of external commands
//! - `scanner`: host and docker scanners behind the `PortScan` trait
//! - `reconcile` / `filter`: pure functions over collected record sets
//! - `engine`: refresh orchestration with single-flight cycles
//!
//! The engine owns no UI, no persisted config and no network surface;
//! a scheduler and presentation layer consume it from the outside.

pub mod actions;
pub mod engine;
pub mod error;
pub mod filter;
pub mod reconcile;
pub mod record;
pub mod runner;
pub mod scanner;

// Re-export the primary API surface
pub use actions::{kill, terminate, ActionOutcome};
pub use engine::{DisplayToggle, PortsEngine};
pub use error::{Error, Result};
pub use filter::{is_ignored, is_system_process, rule_matches};
pub use reconcile::{reconcile, ViewOptions};
pub use record::{PortRecord, PortSource, Protocol, UNKNOWN_COMMAND};
pub use runner::CommandRunner;
pub use scanner::{DockerScanner, HostScanner, PortScan};
