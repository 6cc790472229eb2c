mod doctor;
mod progress;

use std::path::{Path, PathBuf};

use clap::Parser;
use clap::Subcommand;
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::EnvFilter;

use navigator_core::config::AppConfig;
use navigator_core::types::{Operation, Seed};
use navigator_session::Navigator;

#[derive(Parser)]
#[command(name = "navigator", version, about = "Queue and execute graph operation chains")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "navigator.toml", env = "NAVIGATOR_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue every operation in a file and execute them all
    Run {
        /// JSON array of operations
        #[arg(long)]
        ops: PathBuf,
        /// JSON array of seeds ({"vertexType": ..., "vertex": ...})
        #[arg(long)]
        seeds: Option<PathBuf>,
    },
    /// Run a single operation immediately
    Query {
        /// JSON file holding one operation
        #[arg(long)]
        op: PathBuf,
    },
    /// Show current configuration
    Config,
    /// Check the configuration for problems
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("navigator=info,warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Doctor => {
            doctor::run_doctor(&config);
        }
        Commands::Query { op } => {
            let operation: Operation = read_json(&op)?;
            let navigator = Navigator::from_config(&config)?;
            let payload = navigator.run_built_query(operation).await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Commands::Run { ops, seeds } => {
            let operations: Vec<Operation> = read_json(&ops)?;
            let navigator = Navigator::from_config(&config)?;

            if let Some(path) = seeds {
                let seeds: Vec<Seed> = read_json(&path)?;
                navigator.add_seeds(&seeds)?;
                info!(seeds = seeds.len(), "Seeds added");
            }

            for operation in operations {
                navigator.add_operation(operation);
            }

            // Spawn event printer
            let rx = navigator.event_bus().subscribe();
            let print_handle =
                tokio::spawn(progress::follow_batch(rx, |line| eprintln!("{}", line)));

            let report = navigator.execute_all().await;
            if !report.outcomes.is_empty() {
                print_handle.await.ok();
            } else {
                print_handle.abort();
            }

            println!(
                "{}",
                serde_json::to_string_pretty(&navigator.results().elements())?
            );
            eprintln!(
                "{} succeeded, {} dropped, {} failed",
                report.succeeded(),
                report.dropped(),
                report.failed()
            );
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in {}: {}", path.display(), e))
}
