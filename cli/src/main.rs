//! OpenPorts CLI - list open ports and the processes or containers behind them.
//!
//! Thin consumer of the engine: the `watch` subcommand is the periodic
//! scheduler, `list` a one-shot refresh, `kill` the process action surface.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "openports")]
#[command(author, version, about = "List open ports and who owns them")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Hide docker-published ports
    #[arg(long, global = true)]
    no_docker: bool,

    /// Hide system-service ports
    #[arg(long, global = true)]
    no_system: bool,

    /// Ignore rule (literal, '^...$' regex, or '/.../'); repeatable
    #[arg(short, long = "ignore", global = true)]
    ignore: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List open ports once
    #[command(alias = "ls")]
    List,

    /// Refresh and print on an interval
    Watch {
        /// Refresh interval in seconds
        #[arg(short, long, default_value_t = 2.5)]
        interval: f64,
    },

    /// Send a termination signal to a process
    Kill {
        /// Process id
        pid: u32,

        /// Send SIGKILL instead of SIGTERM
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let view = openports_core::ViewOptions {
        show_docker: !cli.no_docker,
        show_system: !cli.no_system,
    };

    match cli.command {
        Commands::List => commands::list::run(cli.ignore, view, cli.json).await,
        Commands::Watch { interval } => {
            commands::watch::run(cli.ignore, view, interval, cli.json).await
        }
        Commands::Kill { pid, force } => commands::kill::run(pid, force),
    }
}
