//! longmem CLI entry point.
//!
//! Binary name: `lmem`
//!
//! Parses CLI arguments, sets up tracing, wires the memory service, then
//! dispatches to the command handler.

mod cli;
mod state;

use anyhow::anyhow;
use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use longmem_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_filter};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(verbosity_filter(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "lmem", &mut std::io::stdout());
        return Ok(());
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init(cli.user).await?;

    match cli.command {
        Commands::Store {
            content,
            importance,
            category,
            topics,
        } => {
            cli::memory::store(&state, &content, importance, &category, topics, cli.json).await?;
        }
        Commands::Search { query, top_k } => {
            cli::memory::search(&state, &query, top_k, cli.json).await?;
        }
        Commands::DeleteAll { force } => {
            cli::memory::delete_all(&state, force, cli.json).await?;
        }
        Commands::Dedup => {
            cli::memory::dedup(&state, cli.json).await?;
        }
        Commands::Stats => {
            cli::memory::stats(&state, cli.json).await?;
        }
        Commands::Tool { name, arguments } => {
            cli::memory::tool(&state, &name, &arguments, cli.json).await?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
