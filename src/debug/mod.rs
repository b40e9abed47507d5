//! Debug bundle writer for inspecting one Train & Predict run.

use std::fmt::Write as _;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::ForecastRun;
use crate::error::AppError;

/// Default bundle directory, relative to the working directory.
pub const DEBUG_DIR: &str = "debug";

/// Write a Markdown bundle for `run` into `dir` and return its path.
pub fn write_debug_bundle(dir: &Path, run: &ForecastRun, source: Option<&Path>) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::runtime(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let seed = run
        .config
        .seed
        .map(|s| format!("seed{s}"))
        .unwrap_or_else(|| "entropy".to_string());
    let path = dir.join(format!("forecast_debug_{seed}_{ts}.md"));

    std::fs::write(&path, render_bundle(run, source))
        .map_err(|e| AppError::runtime(format!("Failed to write debug file '{}': {e}", path.display())))?;
    Ok(path)
}

/// Bundle contents. Formatting into a `String` cannot fail.
pub fn render_bundle(run: &ForecastRun, source: Option<&Path>) -> String {
    let mut out = String::new();
    let config = &run.config;
    let features = &run.features;

    let _ = writeln!(out, "# forecast debug bundle");
    let _ = writeln!(out, "- generated: {}", Local::now().to_rfc3339());
    let _ = writeln!(
        out,
        "- source: {}",
        source.map(|p| p.display().to_string()).unwrap_or_else(|| "-".to_string())
    );
    let _ = writeln!(out, "- records: {}", run.records.len());
    let _ = writeln!(
        out,
        "- seed: {}",
        config.seed.map(|s| s.to_string()).unwrap_or_else(|| "entropy".to_string())
    );
    let _ = writeln!(
        out,
        "- training: epochs={}, hidden={}, lr={}, batch={}",
        config.epochs,
        config.hidden_units,
        config.learning_rate,
        config
            .batch_size
            .map(|b| b.to_string())
            .unwrap_or_else(|| "full".to_string())
    );
    let _ = writeln!(out, "- policy: {}", config.policy.label());
    let _ = writeln!(out, "- horizon: {}", config.horizon.label());
    let _ = writeln!(
        out,
        "- features: samples={}, invalid_dates={}, zero_filled={}, dropped_quantity={}, last_observed={}",
        features.len(),
        features.dropped_invalid_date,
        features.zero_filled,
        features.dropped_invalid_quantity,
        features
            .last_observed
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    let _ = writeln!(out, "\n## Product mapping");
    let _ = writeln!(
        out,
        "| index | product | jan | feb | mar | apr | may | jun | jul | aug | sep | oct | nov | dec |"
    );
    let _ = writeln!(out, "| - | - | - | - | - | - | - | - | - | - | - | - | - | - |");
    for (idx, name) in features.products.iter() {
        let months = features
            .actuals
            .product_totals(idx)
            .map(|m| m.iter().map(|v| format!("{v:.2}")).collect::<Vec<_>>().join(" | "))
            .unwrap_or_else(|| vec!["-"; 12].join(" | "));
        let _ = writeln!(out, "| {idx} | {name} | {months} |");
    }

    let _ = writeln!(out, "\n## Loss history (mse)");
    let _ = writeln!(out, "| epoch | loss |");
    let _ = writeln!(out, "| - | - |");
    for (epoch, loss) in run.training.loss_history.iter().enumerate() {
        let _ = writeln!(out, "| {} | {loss:.6} |", epoch + 1);
    }

    let _ = writeln!(out, "\n## Predictions");
    let _ = writeln!(out, "| step | feature_month | product | predicted |");
    let _ = writeln!(out, "| - | - | - | - |");
    for p in &run.predictions {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.4} |",
            p.month, p.feature_month, p.product, p.predicted
        );
    }

    out
}
