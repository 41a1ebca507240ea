//! Command-line parsing for the retail price explorer.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the aggregation code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::Level;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pw", version, about = "Retail price explorer (agg_prices rollups)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load data, print dataset stats and top movers, optionally a level
    /// table and CSV/JSON exports.
    Report(ReportArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying load pipeline as `pw report`, but
    /// renders results in a terminal UI using Ratatui.
    Tui(LoadArgs),
}

/// Options shared by every command that loads data.
#[derive(Debug, Parser, Clone)]
pub struct LoadArgs {
    /// Use deterministic synthetic data instead of Postgres.
    #[arg(long)]
    pub sample: bool,

    /// Number of days of synthetic data.
    #[arg(long, default_value_t = 90)]
    pub sample_days: usize,

    /// First day of synthetic data (YYYY-MM-DD).
    #[arg(long, default_value = "2024-01-01")]
    pub sample_start: NaiveDate,

    /// Random seed for synthetic data.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Load a previously exported snapshot JSON instead of any live source.
    #[arg(long, value_name = "JSON")]
    pub snapshot: Option<PathBuf>,
}

/// Options for the report command.
#[derive(Debug, Parser)]
pub struct ReportArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Print the full per-day table at this hierarchy level.
    #[arg(long, value_enum)]
    pub level: Option<Level>,

    /// Restrict the table to one main category.
    #[arg(long = "main")]
    pub main_category: Option<String>,

    /// Restrict the table to one sub category (combine with --main).
    #[arg(long = "sub")]
    pub sub_category: Option<String>,

    /// Show top-N risers and fallers.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Export fine/sub/main CSVs into this directory.
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Export the full derived output as snapshot JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}
