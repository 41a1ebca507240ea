//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads rows from the configured source
//! - runs the aggregation pipeline
//! - prints reports / launches the TUI
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, LoadArgs, ReportArgs};
use crate::domain::{Level, SampleConfig, Source};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `pw` binary.
pub fn run() -> Result<(), AppError> {
    // We want `pw` and `pw --sample` to behave like `pw tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => {
            init_logging();
            handle_report(args)
        }
        Command::Tui(args) => handle_tui(args),
    }
}

/// Logging goes to stderr for non-interactive commands; the TUI owns the
/// terminal and reports through its status line instead.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let source = source_from_args(&args.load);
    let run = pipeline::run_load(&source)?;

    println!(
        "{}",
        crate::report::format::format_run_summary(&run, &source_label(&source))
    );

    let level = args.level.unwrap_or(Level::Main);
    let movers = crate::report::rank_movers(&run.sets, level, args.top);
    println!("{}", crate::report::format::format_movers(&movers, level));

    // The full per-day table only when a level was asked for explicitly;
    // it can run to thousands of lines on real data.
    if args.level.is_some() {
        println!(
            "{}",
            crate::report::format::format_level_table(
                &run.sets,
                level,
                args.main_category.as_deref(),
                args.sub_category.as_deref(),
            )
        );
    }

    // Optional exports.
    if let Some(dir) = &args.export_dir {
        let paths = crate::io::export::write_csv_exports(dir, &run.sets)?;
        for path in paths {
            tracing::info!(path = %path.display(), "wrote CSV export");
        }
    }
    if let Some(path) = &args.export_json {
        crate::io::snapshot::write_snapshot(path, &run)?;
        tracing::info!(path = %path.display(), "wrote snapshot");
    }

    Ok(())
}

fn handle_tui(args: LoadArgs) -> Result<(), AppError> {
    crate::tui::run(source_from_args(&args))
}

/// Resolve the data source from shared load flags.
///
/// A snapshot path wins over `--sample`; without either, Postgres.
pub fn source_from_args(args: &LoadArgs) -> Source {
    if let Some(path) = &args.snapshot {
        return Source::Snapshot(path.clone());
    }
    if args.sample {
        return Source::Sample(SampleConfig {
            days: args.sample_days,
            start: args.sample_start,
            seed: args.seed,
        });
    }
    Source::Postgres
}

pub fn source_label(source: &Source) -> String {
    match source {
        Source::Postgres => "postgres (agg_prices)".to_string(),
        Source::Sample(config) => format!("sample (seed={}, days={})", config.seed, config.days),
        Source::Snapshot(path) => format!("snapshot ({})", path.display()),
    }
}

/// Rewrite argv so `pw` defaults to `pw tui`.
///
/// Rules:
/// - `pw`                      -> `pw tui`
/// - `pw --sample ...`         -> `pw tui --sample ...`
/// - `pw --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "report" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
