//! Watch command - the periodic scheduler driving refresh cycles.

use std::time::Duration;

use anyhow::Result;
use openports_core::{PortsEngine, ViewOptions};

pub async fn run(
    ignore_rules: Vec<String>,
    view: ViewOptions,
    interval_secs: f64,
    json: bool,
) -> Result<()> {
    let engine = PortsEngine::new().with_initial_settings(ignore_rules, view);
    let interval = Duration::from_secs_f64(interval_secs.max(0.1));

    // Each refresh is awaited before the next tick is armed, so cycles
    // cannot overlap even if a scan runs up against its timeout.
    loop {
        let records = engine.refresh().await;

        if json {
            println!("{}", serde_json::to_string(&records)?);
        } else {
            print!("\x1b[2J\x1b[H");
            super::print_table(&records);
        }

        tokio::time::sleep(interval).await;
    }
}
