//! CLI command definitions for the `lmem` binary.

pub mod memory;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Long-term memory store for AI agents.
#[derive(Parser)]
#[command(name = "lmem", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// User whose memories to operate on. Defaults to the DIAL appdata home
    /// for the dial backend, "local" otherwise.
    #[arg(long, global = true, env = "LONGMEM_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a new memory.
    Store {
        /// The fact to remember.
        content: String,

        /// How worth keeping this fact is (0.0 to 1.0).
        #[arg(long, default_value_t = 0.5)]
        importance: f32,

        /// Category label, e.g. preferences or personal_info.
        #[arg(long, default_value = "general")]
        category: String,

        /// Topic tag (repeatable).
        #[arg(long = "topic")]
        topics: Vec<String>,
    },

    /// Search memories by semantic similarity.
    Search {
        /// Question or keywords.
        query: String,

        /// Number of results (clamped to the configured maximum).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Delete every memory of the user.
    #[command(name = "delete-all")]
    DeleteAll {
        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Collapse near-duplicate memories now.
    Dedup,

    /// Show collection size and dedup status.
    Stats,

    /// Invoke an agent tool with raw JSON arguments.
    Tool {
        /// store_memory, search_memory or delete_memory.
        name: String,

        /// JSON object with the tool's arguments.
        #[arg(default_value = "{}")]
        arguments: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
