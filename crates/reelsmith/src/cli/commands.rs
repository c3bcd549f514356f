//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// Reelsmith - narrated article scripts to captioned short-form video
#[derive(Parser, Debug)]
#[command(name = "reelsmith")]
#[command(about = "Turns narrated article scripts into captioned short-form videos", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file used instead of the layered defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the planned segments of a script as JSON
    Plan {
        /// JSON array of script beats
        #[arg(long)]
        beats: PathBuf,

        /// Word timings of the narration, used instead of the reading rate
        #[arg(long)]
        alignment: Option<PathBuf>,

        /// Provider whose clip ceiling applies
        #[arg(long)]
        provider: Option<String>,
    },

    /// Admit a run and drive it to a finished video
    Run {
        /// JSON array of script beats
        #[arg(long)]
        beats: PathBuf,

        /// Narration audio file
        #[arg(long)]
        narration: PathBuf,

        /// Word timings of the narration
        #[arg(long)]
        alignment: Option<PathBuf>,

        /// Background music file
        #[arg(long)]
        music: Option<PathBuf>,

        /// Reference of the source article
        #[arg(long)]
        article: String,

        /// Provider profile to use
        #[arg(long)]
        provider: Option<String>,

        /// Output file name (written to the assembly output directory)
        #[arg(long)]
        output: Option<String>,

        /// Provider limit override for this run, as KEY=VALUE
        #[arg(long = "set", value_parser = parse_override)]
        overrides: Vec<(String, String)>,
    },

    /// Continue a stored run after a restart
    Resume {
        /// Run id
        run_id: Uuid,
    },

    /// Reopen a failed run, keeping its finished clips
    Reopen {
        /// Run id
        run_id: Uuid,
    },

    /// Print a stored run as JSON
    Status {
        /// Run id
        run_id: Uuid,
    },

    /// List stored runs
    List,

    /// Render an ASS karaoke caption file from word timings
    Captions {
        /// Word timings of the narration
        #[arg(long)]
        alignment: PathBuf,

        /// Caption file to write
        #[arg(long)]
        output: PathBuf,

        /// Script beats; when given, caption lines never span segments
        #[arg(long)]
        beats: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn parse_override(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", raw))
}
