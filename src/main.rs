use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use genstore::action::{ActionType, WireAction};
use genstore::config::Config;
use genstore::logging::init_tracing;
use genstore::schema::OpKind;
use genstore::store::Store;

#[derive(Debug, Parser)]
#[command(name = "genstore", version, about = "Replay resource actions through a generated reducer")]
struct Cli {
    /// Resource schema file (default: ~/.config/genstore/resources.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply a JSON-lines file of wire actions and print the final state
    Replay {
        file: PathBuf,
        /// Print the state on one line
        #[arg(long)]
        compact: bool,
    },
    /// List every action type the schema accepts
    Types,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level);

    let schema = Arc::new(config.compile()?);
    tracing::debug!(resources = schema.len(), "Schema loaded");

    match cli.command {
        Command::Replay { file, compact } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read '{}'", file.display()))?;
            let mut store = Store::new(schema);

            for (index, line) in content.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let line_no = index + 1;
                let dispatchable = WireAction::parse(line)
                    .and_then(WireAction::into_dispatchable)
                    .with_context(|| format!("{}:{}: invalid action", file.display(), line_no))?;
                store
                    .dispatch(dispatchable)
                    .with_context(|| format!("{}:{}: dispatch failed", file.display(), line_no))?;
            }

            let state = store.state();
            let rendered = if compact {
                serde_json::to_string(state.as_ref())?
            } else {
                serde_json::to_string_pretty(state.as_ref())?
            };
            println!("{}", rendered);
        }
        Command::Types => {
            for (_, node) in schema.iter() {
                for op in OpKind::all() {
                    if node.supports(*op) {
                        let ty = ActionType {
                            path: node.path().clone(),
                            op: *op,
                        };
                        println!("{}", ty);
                    }
                }
            }
        }
    }

    Ok(())
}
