//! DocCtx inspection binary
//!
//! Loads a parsed codebase snapshot (JSON), builds the index in memory and
//! prints the context bundle a documentation generator would receive.
//!
//! ```text
//! docctx context   --snapshot codebase.json --target 'src/app.py::main' [--budget 4000]
//! docctx neighbors --snapshot codebase.json --target 'src/app.py::main' [--hops 2]
//! docctx stats     --snapshot codebase.json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

mod commands;
mod snapshot;

use commands::{ContextRequest, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "docctx", version, about = "Assemble documentation context for code units")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank and pack supporting context for a target unit
    Context {
        /// Snapshot JSON with parsed files and optional vectors
        #[arg(long)]
        snapshot: PathBuf,

        /// Target unit id (`path::qualified_name`)
        #[arg(long)]
        target: String,

        /// Context budget; defaults to the configured budget
        #[arg(long)]
        budget: Option<usize>,

        /// TOML configuration with `[assembler]` and `[indexer]` sections
        #[arg(long, env = "DOCCTX_CONFIG")]
        config: Option<PathBuf>,

        /// Abandon assembly after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List units reachable from a target through references
    Neighbors {
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        target: String,

        #[arg(long, default_value_t = 2)]
        hops: usize,
    },

    /// Print index statistics as JSON
    Stats {
        #[arg(long)]
        snapshot: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let output = match cli.command {
        Command::Context {
            snapshot,
            target,
            budget,
            config,
            timeout_ms,
            format,
        } => {
            commands::context(ContextRequest {
                snapshot: &snapshot,
                target: &target,
                budget,
                config: config.as_deref(),
                timeout: timeout_ms.map(Duration::from_millis),
                format,
            })
            .await?
        }
        Command::Neighbors {
            snapshot,
            target,
            hops,
        } => commands::neighbors(&snapshot, &target, hops).await?,
        Command::Stats { snapshot } => commands::stats(&snapshot).await?,
    };

    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
