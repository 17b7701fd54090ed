//! `lineage`: command-line host for the rubric version graph

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lineage_graph::{ActionFilter, FilterCriteria};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lineage", version, about = "Rubric version graph tools")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Engine configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the graph snapshot for a history file
    Render {
        /// History file (JSON array of entries)
        history: PathBuf,

        /// Case-insensitive search over modifier, field and comment
        #[arg(long, default_value = "")]
        search: String,

        /// Only entries with this action (`all` to disable)
        #[arg(long, default_value = "all")]
        action: ActionFilter,

        /// Write the snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Append a merge of the given versions
    Merge {
        /// History file (JSON array of entries)
        history: PathBuf,

        /// Version ids to merge
        ids: Vec<String>,

        /// Write the updated history here instead of in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarise a history file
    Stats {
        /// History file (JSON array of entries)
        history: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Render {
            history,
            search,
            action,
            output,
        } => {
            let store = commands::load_history(&history)?;
            let criteria = FilterCriteria::all().with_search(search).with_action(action);
            let snapshot = commands::render(store, config, criteria);
            tracing::info!(
                nodes = snapshot.nodes.len(),
                edges = snapshot.edges.len(),
                "snapshot rendered"
            );
            write_json(&*snapshot, output.as_deref())?;
        }
        Command::Merge {
            history,
            ids,
            output,
        } => {
            let store = commands::load_history(&history)?;
            let (store, merged) = commands::merge(store, config, &ids)?;
            let target = output.as_deref().unwrap_or(&history);
            commands::save_history(target, &store)?;
            tracing::info!(id = %merged.id, path = %target.display(), "merge written");
            write_json(&merged, None)?;
        }
        Command::Stats { history } => {
            let store = commands::load_history(&history)?;
            write_json(&commands::stats(store, config), None)?;
        }
    }
    Ok(())
}
