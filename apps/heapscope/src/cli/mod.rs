//! # Heapscope CLI Module
//!
//! This module implements the CLI interface for Heapscope.
//!
//! ## Available Commands
//!
//! - `tree` - Print the grouped native object tree
//! - `summary` - Show totals and the heaviest top-level rows
//! - `find` - Locate the object at a native address
//! - `convert` - Convert a JSON snapshot to the binary format

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand};
use heapscope_core::HeapscopeError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Heapscope - native object browser
///
/// Groups the native objects of a captured memory snapshot by type,
/// aggregates their sizes and prints the result.
#[derive(Parser, Debug)]
#[command(name = "heapscope")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Path to a TOML config file (overrides HEAPSCOPE_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the grouped native object tree
    Tree {
        /// Snapshot file (binary or JSON)
        snapshot: PathBuf,

        /// Sort column (type-name, size, count, address, dont-destroy-on-load,
        /// persistent, instance-id, references, referenced-by)
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort ascending
        #[arg(long, conflicts_with = "descending")]
        ascending: bool,

        /// Sort descending
        #[arg(long)]
        descending: bool,

        /// Number of levels to print
        #[arg(short, long)]
        depth: Option<usize>,

        /// Count references while building
        #[arg(short, long)]
        references: bool,
    },

    /// Show totals and the heaviest top-level rows
    Summary {
        /// Snapshot file (binary or JSON)
        snapshot: PathBuf,

        /// Number of rows to list
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,
    },

    /// Locate the object at a native address
    Find {
        /// Snapshot file (binary or JSON)
        snapshot: PathBuf,

        /// Address, hex (0x...) or decimal
        #[arg(short, long)]
        address: String,
    },

    /// Convert a JSON snapshot to the binary format
    Convert {
        /// JSON snapshot
        input: PathBuf,

        /// Binary output file
        output: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), HeapscopeError> {
    let config = Config::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Tree {
            snapshot,
            sort,
            ascending,
            descending,
            depth,
            references,
        } => {
            let direction = if ascending {
                Some(true)
            } else if descending {
                Some(false)
            } else {
                None
            };
            let view = ViewArgs {
                sort,
                ascending: direction,
                depth,
                references,
            }
            .resolve(&config)?;
            cmd_tree(&config, &snapshot, view, json_mode)
        }
        Commands::Summary { snapshot, top } => cmd_summary(&config, &snapshot, top, json_mode),
        Commands::Find { snapshot, address } => cmd_find(&config, &snapshot, &address, json_mode),
        Commands::Convert { input, output } => cmd_convert(&config, &input, &output, json_mode),
    }
}
