use clap::{Parser, Subcommand};

use crate::config::{DEFAULT_REF_ENV, MAX_DEPTH_ENV, SERVER_URL_ENV};

/// Retro cabinet - browse the checkpoint history of a retro server
#[derive(Parser)]
#[command(name = "retro-cabinet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Server to browse (overrides the settings file and RETRO_CABINET_SERVER_URL)
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding settings.json. Defaults to ~/.retro-cabinet
    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the refs of the server
    Refs,
    /// Print the first-parent history of a ref or checkpoint
    Log {
        /// Ref name or checkpoint hash (defaults to the default ref)
        target: Option<String>,

        /// Stop after this many checkpoints
        #[arg(long)]
        max_depth: Option<usize>,

        /// Also list the events each checkpoint appended
        #[arg(long)]
        affix: bool,

        /// Print the history as JSON
        #[arg(long, conflicts_with = "affix")]
        json: bool,
    },
    /// Print a raw object by hash
    Show {
        hash: String,
    },
    /// Interactive browser
    Browse,
    /// Show or change stored settings
    #[command(after_help = format!(
        "Environment overrides: {}, {}, {}",
        SERVER_URL_ENV, DEFAULT_REF_ENV, MAX_DEPTH_ENV
    ))]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Store the server URL
    SetServer { url: String },
    /// Store the ref selected when none is given
    SetDefaultRef { name: String },
    /// Fall back to the last ref the server lists
    ClearDefaultRef,
}
