//! # cohortview - Biochemical Metrics Dashboard
//!
//! The main binary for the cohortview dashboard.
//!
//! This application provides:
//! - HTML dashboard and JSON API server (axum-based)
//! - CLI interface for offline inspection and charting
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 apps/cohortview (THE BINARY)                │
//! │                                                             │
//! │  ┌─────────────┐    ┌──────────────────┐    ┌───────────┐   │
//! │  │    CLI      │    │  HTTP dashboard  │    │  Config   │   │
//! │  │   (clap)    │    │     (axum)       │    │  (toml)   │   │
//! │  └──────┬──────┘    └────────┬─────────┘    └─────┬─────┘   │
//! │         │                    │                    │         │
//! │         └────────────────────┼────────────────────┘         │
//! │                              ▼                              │
//! │                    ┌──────────────────┐                     │
//! │                    │  cohortview-core │                     │
//! │                    │   (THE LOGIC)    │                     │
//! │                    └──────────────────┘                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the dashboard
//! cohortview server --host 0.0.0.0 --port 8501
//!
//! # CLI operations
//! cohortview inspect -f pigs.csv
//! cohortview chart -f pigs.csv -m ALT -g age --ages 3,6,12 -o alt.html
//! ```

use clap::Parser;
use cohortview::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // COHORTVIEW_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("COHORTVIEW_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cohortview=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  cohortview v{}
  Biochemical metrics by sex and age
"#,
        env!("CARGO_PKG_VERSION")
    );
}
