//! List command - one refresh cycle, printed once.

use anyhow::Result;
use openports_core::{PortsEngine, ViewOptions};

pub async fn run(ignore_rules: Vec<String>, view: ViewOptions, json: bool) -> Result<()> {
    let engine = PortsEngine::new().with_initial_settings(ignore_rules, view);
    let records = engine.refresh().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    super::print_table(&records);
    Ok(())
}
