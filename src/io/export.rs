//! Export predictions to CSV and chart series to JSON.
//!
//! The series JSON is the portable form of a rendered chart: `forecast plot`
//! reads it back without retraining.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::chart::ChartSeriesSet;
use crate::domain::{ForecastConfig, PredictionEntry};
use crate::error::AppError;

/// On-disk wrapper for a chart series set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFile {
    pub tool: String,
    pub generated_at: DateTime<Local>,
    pub config: ForecastConfig,
    pub chart: ChartSeriesSet,
}

impl SeriesFile {
    pub fn new(config: &ForecastConfig, chart: ChartSeriesSet) -> Self {
        Self {
            tool: "forecast".to_string(),
            generated_at: Local::now(),
            config: config.clone(),
            chart,
        }
    }
}

/// Write one CSV row per prediction entry.
pub fn write_predictions_csv(path: &Path, predictions: &[PredictionEntry]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::input(format!("Failed to create predictions CSV '{}': {e}", path.display())))?;

    writer
        .write_record(["product", "product_index", "month", "feature_month", "predicted"])
        .map_err(|e| AppError::input(format!("Failed to write predictions CSV header: {e}")))?;

    for p in predictions {
        writer
            .write_record([
                p.product.clone(),
                p.product_index.to_string(),
                p.month.to_string(),
                p.feature_month.to_string(),
                format!("{:.6}", p.predicted),
            ])
            .map_err(|e| AppError::input(format!("Failed to write predictions CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush predictions CSV: {e}")))?;
    Ok(())
}

pub fn write_series_json(path: &Path, file: &SeriesFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create series JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file).map_err(|e| AppError::input(format!("Failed to write series JSON: {e}")))?;
    Ok(())
}

pub fn read_series_json(path: &Path) -> Result<SeriesFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open series JSON '{}': {e}", path.display())))?;
    let series: SeriesFile =
        serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid series JSON: {e}")))?;
    Ok(series)
}
