//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the ingest, feature, model, and chart stages
//! - exported to CSV/JSON
//! - reloaded later for plotting

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Number of forecast points produced per product.
pub const HORIZON_MONTHS: u32 = 6;

/// Passes over the full dataset per training run.
pub const DEFAULT_EPOCHS: usize = 50;

/// Upper bound accepted for `epochs`.
pub const MAX_EPOCHS: usize = 100_000;

/// Width of the single hidden layer.
pub const DEFAULT_HIDDEN_UNITS: usize = 10;

/// Adam step size.
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;

/// How the Feature Builder treats a quantity that does not parse as a number.
///
/// Dates are never zero-filled: a row whose `sales_date` has no month is dropped
/// under both policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidValuePolicy {
    /// Coerce unparsable quantities to `0` and keep the row.
    #[default]
    ZeroFillInvalidNumeric,
    /// Drop any row with an unparsable quantity.
    DropInvalidRows,
}

impl InvalidValuePolicy {
    pub fn label(self) -> &'static str {
        match self {
            InvalidValuePolicy::ZeroFillInvalidNumeric => "zero-fill-invalid-numeric",
            InvalidValuePolicy::DropInvalidRows => "drop-invalid-rows",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            InvalidValuePolicy::ZeroFillInvalidNumeric => InvalidValuePolicy::DropInvalidRows,
            InvalidValuePolicy::DropInvalidRows => InvalidValuePolicy::ZeroFillInvalidNumeric,
        }
    }
}

/// Which calendar month each horizon step is fed to the model as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HorizonMode {
    /// Step `k` is evaluated as calendar month `k` (January..June), regardless of
    /// where the history ends.
    #[default]
    CalendarMonthReuse,
    /// Step `k` is evaluated as the `k`-th month after the last observed month,
    /// wrapping December → January.
    #[value(name = "rolling-horizon-from-last-observed-month", alias = "rolling")]
    #[serde(rename = "rolling-horizon-from-last-observed-month")]
    RollingHorizon,
}

impl HorizonMode {
    pub fn label(self) -> &'static str {
        match self {
            HorizonMode::CalendarMonthReuse => "calendar-month-reuse",
            HorizonMode::RollingHorizon => "rolling-horizon-from-last-observed-month",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            HorizonMode::CalendarMonthReuse => HorizonMode::RollingHorizon,
            HorizonMode::RollingHorizon => HorizonMode::CalendarMonthReuse,
        }
    }
}

/// Which "actual sales" comparison series (if any) accompany the predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ActualOverlay {
    /// Predicted series only.
    #[default]
    None,
    /// Summed monthly actuals, shown only for the selected product.
    Aggregated,
    /// First matching record per month, shown for every visible product.
    FirstMatch,
}

impl ActualOverlay {
    pub fn label(self) -> &'static str {
        match self {
            ActualOverlay::None => "none",
            ActualOverlay::Aggregated => "aggregated",
            ActualOverlay::FirstMatch => "first-match",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ActualOverlay::None => ActualOverlay::Aggregated,
            ActualOverlay::Aggregated => ActualOverlay::FirstMatch,
            ActualOverlay::FirstMatch => ActualOverlay::None,
        }
    }
}

/// One row of the uploaded CSV after the falsy-field filter.
///
/// Cells are kept as trimmed text: interpreting the date and the quantity is the
/// Feature Builder's job, so a row with an unparsable date still reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub sales_date: String,
    pub product_description: String,
    pub quantity_sold: String,
}

impl SalesRecord {
    pub fn new(
        sales_date: impl Into<String>,
        product_description: impl Into<String>,
        quantity_sold: impl Into<String>,
    ) -> Self {
        Self {
            sales_date: sales_date.into(),
            product_description: product_description.into(),
            quantity_sold: quantity_sold.into(),
        }
    }
}

/// Model input: calendar month (1–12) and product index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePair {
    pub month: u32,
    pub product: usize,
}

impl FeaturePair {
    pub fn as_input(self) -> [f64; 2] {
        [self.month as f64, self.product as f64]
    }
}

/// One model evaluation over the forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEntry {
    pub product: String,
    pub product_index: usize,
    /// Horizon step, 1..=6.
    pub month: u32,
    /// Calendar month (1–12) the model was evaluated at for this step.
    pub feature_month: u32,
    /// Unconstrained model output; may be negative.
    pub predicted: f64,
}

/// Training and prediction settings for one Train & Predict run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub epochs: usize,
    pub hidden_units: usize,
    pub learning_rate: f64,
    /// Mini-batch size; `None` takes one full-batch step per epoch.
    pub batch_size: Option<usize>,
    /// Weight initialization seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub policy: InvalidValuePolicy,
    pub horizon: HorizonMode,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            hidden_units: DEFAULT_HIDDEN_UNITS,
            learning_rate: DEFAULT_LEARNING_RATE,
            batch_size: None,
            seed: None,
            policy: InvalidValuePolicy::default(),
            horizon: HorizonMode::default(),
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.epochs == 0 {
            return Err(AppError::input("Epochs must be > 0."));
        }
        if self.epochs > MAX_EPOCHS {
            return Err(AppError::input(format!(
                "Epochs must be <= {MAX_EPOCHS} (got {}).",
                self.epochs
            )));
        }
        if self.hidden_units == 0 {
            return Err(AppError::input("Hidden units must be > 0."));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(AppError::input(format!(
                "Invalid learning rate {} (must be finite and > 0).",
                self.learning_rate
            )));
        }
        if self.batch_size == Some(0) {
            return Err(AppError::input("Batch size must be > 0."));
        }
        Ok(())
    }
}

/// Presentation filters applied by the Chart Presenter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartOptions {
    /// Case-insensitive substring filter on product names; empty shows all.
    pub search: String,
    /// Single selected product; `None` shows all products.
    pub selected: Option<String>,
    pub overlay: ActualOverlay,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_fixed_topology() {
        let config = ForecastConfig::default();
        assert_eq!(config.epochs, 50);
        assert_eq!(config.hidden_units, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_numbers() {
        let config = ForecastConfig {
            learning_rate: f64::NAN,
            ..ForecastConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ForecastConfig {
            batch_size: Some(0),
            ..ForecastConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_caps_epochs() {
        let at_cap = ForecastConfig {
            epochs: MAX_EPOCHS,
            ..ForecastConfig::default()
        };
        assert!(at_cap.validate().is_ok());

        let huge = ForecastConfig {
            epochs: usize::MAX,
            ..ForecastConfig::default()
        };
        let err = huge.validate().unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }

    #[test]
    fn policy_and_horizon_labels_use_recognized_values() {
        assert_eq!(InvalidValuePolicy::DropInvalidRows.label(), "drop-invalid-rows");
        assert_eq!(
            InvalidValuePolicy::ZeroFillInvalidNumeric.toggle(),
            InvalidValuePolicy::DropInvalidRows
        );
        assert_eq!(HorizonMode::RollingHorizon.label(), "rolling-horizon-from-last-observed-month");
        assert_eq!(ActualOverlay::FirstMatch.next(), ActualOverlay::None);
    }
}
