//! Shared "Train & Predict" pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! records -> features -> fresh model -> training -> horizon predictions
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use tracing::{error, info};

use crate::chart::{ActualSources, ChartSeriesSet, build_series_set};
use crate::domain::{ChartOptions, ForecastConfig, PredictionEntry, SalesRecord};
use crate::error::AppError;
use crate::features::{FeatureSet, build_features};
use crate::fit::{TrainOptions, TrainingReport, train};
use crate::forecast::predict_horizon;
use crate::models::Mlp;

/// All computed outputs of a single Train & Predict run.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub records: Vec<SalesRecord>,
    pub features: FeatureSet,
    pub model: Mlp,
    pub training: TrainingReport,
    pub predictions: Vec<PredictionEntry>,
    pub config: ForecastConfig,
}

impl ForecastRun {
    /// Chart series for the given filters, with both actual sources available.
    pub fn series(&self, options: &ChartOptions) -> ChartSeriesSet {
        let actuals = ActualSources {
            aggregated: &self.features.actuals,
            records: &self.records,
        };
        build_series_set(&self.predictions, Some(actuals), options)
    }
}

/// Execute the full pipeline on one upload.
///
/// Every call builds and trains a brand-new model. `Ok(None)` means there was
/// nothing usable to train on; that outcome is logged, not raised.
pub fn run_forecast(records: &[SalesRecord], config: &ForecastConfig) -> Result<Option<ForecastRun>, AppError> {
    config.validate()?;

    // 1) Features (single pass, aligned inputs/outputs).
    let features = build_features(records, config.policy);
    if features.is_empty() {
        error!(records = records.len(), "no usable training rows; nothing to forecast");
        return Ok(None);
    }

    // 2) Fresh model, trained from scratch.
    let mut model = Mlp::seeded(config.hidden_units, config.seed);
    let Some(training) = train(&mut model, &features.inputs, &features.outputs, TrainOptions::from(config))? else {
        return Ok(None);
    };

    // 3) Horizon predictions for every mapped product.
    let predictions = predict_horizon(&model, &features.products, config.horizon, features.last_observed_month());

    info!(
        products = features.products.len(),
        predictions = predictions.len(),
        seeded = config.seed.is_some(),
        "forecast run complete"
    );

    Ok(Some(ForecastRun {
        records: records.to_vec(),
        features,
        model,
        training,
        predictions,
        config: config.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> ForecastConfig {
        ForecastConfig {
            seed: Some(42),
            ..ForecastConfig::default()
        }
    }

    #[test]
    fn empty_upload_yields_no_run() {
        assert!(run_forecast(&[], &seeded()).unwrap().is_none());
    }

    #[test]
    fn all_invalid_dates_yield_no_run() {
        let records = vec![SalesRecord::new("nope", "Widget A", "3")];
        assert!(run_forecast(&records, &seeded()).unwrap().is_none());
    }

    #[test]
    fn invalid_config_is_an_error() {
        let config = ForecastConfig {
            epochs: 0,
            ..ForecastConfig::default()
        };
        let records = vec![SalesRecord::new("2024-01-01", "Widget A", "3")];
        assert!(run_forecast(&records, &config).is_err());
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let records = vec![
            SalesRecord::new("2024-01-01", "Widget A", "3"),
            SalesRecord::new("2024-02-01", "Gadget B", "8"),
        ];
        let a = run_forecast(&records, &seeded()).unwrap().unwrap();
        let b = run_forecast(&records, &seeded()).unwrap().unwrap();
        assert_eq!(a.predictions, b.predictions);
        assert_eq!(a.training.loss_history.len(), 50);
        assert_eq!(a.predictions.len(), 12);
    }
}
