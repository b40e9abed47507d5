//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - ingests the sales CSV and runs the forecast pipeline
//! - prints reports/plots and writes optional exports

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::{Command, PlotArgs, RunArgs};
use crate::error::AppError;

pub mod pipeline;
pub mod session;

/// Log file used while the TUI owns the terminal.
pub const TUI_LOG_FILE: &str = "forecast.log";

/// Entry point for the `forecast` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is normal; anything else is worth a warning once logging is up.
    let dotenv = dotenvy::dotenv();

    // We want `forecast` and `forecast --seed 7` to behave like `forecast tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_tracing(cli.verbose, matches!(cli.command, Command::Tui(_)));
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("failed to load .env: {e}"),
    }

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Tui(args) => crate::tui::run(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn init_tracing(verbose: bool, to_file: bool) {
    let default = if verbose {
        "sales_forecast=debug,warn"
    } else {
        "sales_forecast=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if to_file {
        // The TUI owns stdout/stderr; without a log file we stay silent.
        if let Ok(file) = File::create(TUI_LOG_FILE) {
            let layer = fmt::layer().with_writer(Mutex::new(file)).with_ansi(false);
            let _ = tracing_subscriber::registry().with(layer).with(filter).try_init();
        }
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let path = match &args.file {
        Some(p) => crate::cli::picker::validate_csv_path(p)?,
        None => crate::cli::picker::prompt_for_csv_path()?,
    };
    let config = args.train.to_config();
    config.validate()?;

    let ingest = crate::io::ingest::load_sales_csv(&path)?;
    let errors = crate::report::format_row_errors(&ingest, 10);
    if !errors.is_empty() {
        eprint!("{errors}");
    }

    let Some(run) = pipeline::run_forecast(&ingest.records, &config)? else {
        if args.export_predictions.is_some() || args.export_series.is_some() {
            return Err(AppError::no_data(format!(
                "No usable rows in '{}'; nothing to export.",
                path.display()
            )));
        }
        println!("No usable rows in '{}'; no forecast produced.", path.display());
        return Ok(());
    };

    println!("{}", crate::report::format_run_summary(&ingest, &run));
    let totals = crate::report::rank_by_forecast_total(&run.predictions);
    println!("{}", crate::report::format_rankings(&totals, args.top));
    println!("{}", crate::report::format_prediction_table(&run.predictions));

    let chart = run.series(&args.chart.to_options());
    if !args.no_plot {
        println!("{}", crate::plot::render_series_plot(&chart, args.width, args.height));
    }

    // Optional exports.
    if let Some(out) = &args.export_predictions {
        crate::io::export::write_predictions_csv(out, &run.predictions)?;
        println!("Wrote predictions: {}", out.display());
    }
    if let Some(out) = &args.export_series {
        let file = crate::io::export::SeriesFile::new(&run.config, chart);
        crate::io::export::write_series_json(out, &file)?;
        println!("Wrote series: {}", out.display());
    }
    if args.debug_bundle {
        let bundle = crate::debug::write_debug_bundle(Path::new(crate::debug::DEBUG_DIR), &run, Some(&path))?;
        println!("Wrote debug bundle: {}", bundle.display());
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::export::read_series_json(&args.series)?;
    if file.chart.series.is_empty() {
        return Err(AppError::no_data(format!(
            "Series file '{}' has no series to plot.",
            args.series.display()
        )));
    }
    println!("{}", crate::plot::render_series_plot(&file.chart, args.width, args.height));
    Ok(())
}

/// Resolve the CSV the TUI should open on startup, if any.
pub fn startup_file(file: Option<&PathBuf>) -> Result<Option<PathBuf>, AppError> {
    file.map(|p| crate::cli::picker::validate_csv_path(p)).transpose()
}

/// Rewrite argv so `forecast` defaults to `forecast tui`.
///
/// Rules:
/// - `forecast`                      -> `forecast tui`
/// - `forecast --seed 7 ...`         -> `forecast tui --seed 7 ...`
/// - `forecast -v run ...`           -> unchanged (global flag before a subcommand)
/// - `forecast --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let has_subcommand = argv[1..]
        .iter()
        .any(|a| matches!(a.as_str(), "run" | "tui" | "plot"));
    if has_subcommand {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_binary_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&["forecast"])), argv(&["forecast", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["forecast", "--seed", "7"])),
            argv(&["forecast", "tui", "--seed", "7"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        for args in [
            argv(&["forecast", "run", "-f", "x.csv"]),
            argv(&["forecast", "plot", "--series", "s.json"]),
            argv(&["forecast", "--help"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }

    #[test]
    fn global_verbose_before_subcommand_is_kept() {
        use crate::cli::Cli;

        let args = argv(&["forecast", "-v", "run", "-f", "x.csv"]);
        let rewritten = rewrite_args(args.clone());
        assert_eq!(rewritten, args);

        let cli = Cli::try_parse_from(rewritten).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Run(_)));

        let cli = Cli::try_parse_from(rewrite_args(argv(&["forecast", "-v"]))).unwrap();
        assert!(matches!(cli.command, Command::Tui(_)));
    }
}
