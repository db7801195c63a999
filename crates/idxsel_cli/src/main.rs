//! idxsel CLI
//!
//! Command-line index advisor.
//!
//! # Commands
//!
//! - `recommend` - Select indexes for a workload under a configuration
//! - `candidates` - List the syntactically relevant candidates per query
//! - `version` - Show version information

mod commands;
mod input;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// idxsel command-line index advisor.
#[derive(Parser)]
#[command(name = "idxsel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select indexes for a workload
    Recommend {
        /// Workload file (JSON)
        #[arg(short, long)]
        workload: PathBuf,

        /// Algorithm configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Write the drop heuristic's removal order to this file
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// List candidate indexes per query
    Candidates {
        /// Workload file (JSON)
        #[arg(short, long)]
        workload: PathBuf,

        /// Maximum number of columns per candidate
        #[arg(short, long, default_value = "2")]
        max_index_width: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Recommend {
            workload,
            config,
            format,
            history,
        } => {
            commands::recommend::run(&workload, &config, &format, history.as_deref())?;
        }
        Commands::Candidates {
            workload,
            max_index_width,
            format,
        } => {
            commands::candidates::run(&workload, max_index_width, &format)?;
        }
        Commands::Version => {
            println!("idxsel CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("idxsel Core v{}", idxsel_core::VERSION);
        }
    }

    Ok(())
}
