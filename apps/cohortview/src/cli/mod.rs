//! # cohortview CLI Module
//!
//! This module implements the CLI interface for cohortview.
//!
//! ## Available Commands
//!
//! - `server` - Start the dashboard server
//! - `inspect` - Validate a CSV and summarize what can be charted
//! - `chart` - Build a box chart from a CSV, print group statistics
//! - `pages` - List the dashboard pages

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use cohortview_core::{CohortError, GroupingMode};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// cohortview - biochemical metrics dashboard
///
/// Upload a CSV of per-animal measurements and compare one metric across
/// sex or age groups.
#[derive(Parser, Debug)]
#[command(name = "cohortview")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the dashboard server
    Server {
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate a CSV and list candidate metrics and ages
    Inspect {
        /// Path to the CSV file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Build a box chart for one metric
    Chart {
        /// Path to the CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Metric column (default: first numeric column)
        #[arg(short, long)]
        metric: Option<String>,

        /// Grouping mode (sex, age)
        #[arg(short, long)]
        group: Option<GroupingMode>,

        /// Ages to keep, comma-separated (default: the three smallest)
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        ages: Option<Vec<f64>>,

        /// Write the figure: `.json` for plotly JSON, anything else for HTML
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the filtered rows as CSV
        #[arg(long)]
        table_out: Option<PathBuf>,
    },

    /// List dashboard pages
    Pages,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), CohortError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            let mut config = AppConfig::load(cli.config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(config).await
        }
        Some(Commands::Inspect { file }) => cmd_inspect(&file, json_mode, cli.verbose),
        Some(Commands::Chart {
            file,
            metric,
            group,
            ages,
            output,
            table_out,
        }) => cmd_chart(
            &file,
            ChartOptions {
                metric,
                group,
                ages,
                output,
                table_out,
            },
            json_mode,
        ),
        Some(Commands::Pages) | None => cmd_pages(json_mode),
    }
}
