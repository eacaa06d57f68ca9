//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Rewind - record/replay cache inspector
///
/// Inspects and maintains the record files and usage counters that make
/// nondeterministic service calls reproducible in tests.
#[derive(Parser, Debug)]
#[command(name = "rewind")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "REWIND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .rewind.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the resolved test mode
    Mode,

    /// Inspect and maintain recorded calls
    Records(RecordsArgs),

    /// Inspect usage counters
    Count(CountArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the records command
#[derive(Parser, Debug)]
pub struct RecordsArgs {
    /// Subcommand for records
    #[command(subcommand)]
    pub action: RecordsAction,
}

/// Records subcommands
#[derive(Subcommand, Debug)]
pub enum RecordsAction {
    /// List records at a cache location
    List {
        /// Cache location (defaults to config, then current directory)
        location: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one record as JSON
    Show {
        /// Record hash or unique hash prefix
        hash: String,

        /// Cache location (defaults to config, then current directory)
        #[arg(short, long)]
        location: Option<PathBuf>,
    },

    /// Delete the location's lock file
    Unlock {
        /// Cache location (defaults to config, then current directory)
        location: Option<PathBuf>,
    },
}

/// Arguments for the count command
#[derive(Parser, Debug)]
pub struct CountArgs {
    /// Subcommand for count
    #[command(subcommand)]
    pub action: CountAction,
}

/// Count subcommands
#[derive(Subcommand, Debug)]
pub enum CountAction {
    /// Print the current count
    Show {
        /// Counter file (defaults to config)
        path: Option<PathBuf>,
    },

    /// Reset the count to zero
    Reset {
        /// Counter file (defaults to config)
        path: Option<PathBuf>,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
