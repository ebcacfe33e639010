//! CLI command implementations.

pub mod kill;
pub mod list;
pub mod watch;

use openports_core::PortRecord;

/// Render records as the fixed-width table shared by `list` and `watch`.
pub fn print_table(records: &[PortRecord]) {
    if records.is_empty() {
        println!("No open ports found.");
        return;
    }

    println!(
        "{:<6} {:<6} {:<8} {:<8} {:<24} ADDRESS",
        "PORT", "PROTO", "SOURCE", "PID", "COMMAND"
    );
    println!("{}", "-".repeat(80));

    for rec in records {
        let pid = rec.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<6} {:<6} {:<8} {:<8} {:<24} {}",
            rec.port,
            rec.protocol,
            rec.source,
            pid,
            truncate(&rec.command, 24),
            rec.raw_address
        );
    }

    println!("\nTotal: {} ports", records.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{}…", cut)
    }
}
