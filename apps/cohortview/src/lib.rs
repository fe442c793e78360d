//! # cohortview
//!
//! Library half of the cohortview binary: the axum dashboard server, the
//! clap CLI and the configuration layer. `main.rs` only sets up logging and
//! dispatches to [`cli::execute`].

pub mod api;
pub mod cli;
pub mod config;
