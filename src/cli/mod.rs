//! Command-line parsing for the sales forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the feature/model code.
//!
//! Training flags can also come from the environment (`FORECAST_*`); a `.env`
//! file in the working directory is loaded before parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    ActualOverlay, ChartOptions, DEFAULT_EPOCHS, DEFAULT_HIDDEN_UNITS, DEFAULT_LEARNING_RATE, ForecastConfig,
    HorizonMode, InvalidValuePolicy,
};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Monthly sales forecaster (CSV -> MLP -> 6-month chart)")]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train on a sales CSV, print predictions, and optionally plot/export.
    Run(RunArgs),
    /// Launch the interactive TUI.
    ///
    /// Uses the same pipeline as `forecast run`, rendered with Ratatui.
    Tui(TuiArgs),
    /// Plot a previously exported series JSON.
    Plot(PlotArgs),
}

/// Training/prediction settings shared by `run` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Seed for weight initialization; omit for a fresh random start each run.
    #[arg(long, env = "FORECAST_SEED")]
    pub seed: Option<u64>,

    /// Training epochs.
    #[arg(long, env = "FORECAST_EPOCHS", default_value_t = DEFAULT_EPOCHS)]
    pub epochs: usize,

    /// Hidden layer width.
    #[arg(long, default_value_t = DEFAULT_HIDDEN_UNITS)]
    pub hidden_units: usize,

    /// Adam learning rate.
    #[arg(long, env = "FORECAST_LEARNING_RATE", default_value_t = DEFAULT_LEARNING_RATE)]
    pub learning_rate: f64,

    /// Mini-batch size (default: full batch).
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Handling of quantities that are not numbers.
    #[arg(long, value_enum, env = "FORECAST_POLICY", default_value_t = InvalidValuePolicy::default())]
    pub policy: InvalidValuePolicy,

    /// Which calendar month each forecast step is evaluated at.
    #[arg(long, value_enum, env = "FORECAST_HORIZON", default_value_t = HorizonMode::default())]
    pub horizon: HorizonMode,
}

impl TrainArgs {
    pub fn to_config(&self) -> ForecastConfig {
        ForecastConfig {
            epochs: self.epochs,
            hidden_units: self.hidden_units,
            learning_rate: self.learning_rate,
            batch_size: self.batch_size,
            seed: self.seed,
            policy: self.policy,
            horizon: self.horizon,
        }
    }
}

/// Chart filters shared by `run` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct ChartArgs {
    /// Case-insensitive substring filter on product names.
    #[arg(long, default_value = "")]
    pub search: String,

    /// Show a single product.
    #[arg(long, value_name = "PRODUCT")]
    pub select: Option<String>,

    /// Actual-sales overlay.
    #[arg(long, value_enum, default_value_t = ActualOverlay::None)]
    pub overlay: ActualOverlay,
}

impl ChartArgs {
    pub fn to_options(&self) -> ChartOptions {
        ChartOptions {
            search: self.search.clone(),
            selected: self.select.clone().filter(|s| !s.trim().is_empty()),
            overlay: self.overlay,
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Sales CSV (sales_date, product_description, quantity_sold). Prompts when omitted.
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub train: TrainArgs,

    #[command(flatten)]
    pub chart: ChartArgs,

    /// Show top-N products by forecast total.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export predictions to CSV.
    #[arg(long = "export-predictions", value_name = "CSV")]
    pub export_predictions: Option<PathBuf>,

    /// Export the rendered chart series to JSON.
    #[arg(long = "export-series", value_name = "JSON")]
    pub export_series: Option<PathBuf>,

    /// Write a Markdown debug bundle under ./debug.
    #[arg(long)]
    pub debug_bundle: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct TuiArgs {
    /// Sales CSV to load on startup.
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub train: TrainArgs,

    #[command(flatten)]
    pub chart: ChartArgs,
}

/// Options for plotting a saved series file.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Series JSON produced by `forecast run --export-series`.
    #[arg(long, value_name = "JSON")]
    pub series: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}
