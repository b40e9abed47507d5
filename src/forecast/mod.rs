//! Prediction driver: evaluate a trained model over the forecast horizon.
//!
//! The loop order is fixed: horizon step (outer, 1..=6) × products in mapping
//! order (inner). Each entry is one independent model evaluation.

use tracing::debug;

use crate::domain::{HORIZON_MONTHS, HorizonMode, PredictionEntry};
use crate::features::ProductIndex;
use crate::models::Mlp;

/// Calendar month (1–12) fed to the model for horizon step `step` (1-based).
///
/// `last_observed_month` only matters for the rolling mode; without it the
/// rolling horizon starts in January.
pub fn feature_month(mode: HorizonMode, step: u32, last_observed_month: Option<u32>) -> u32 {
    match mode {
        HorizonMode::CalendarMonthReuse => step,
        HorizonMode::RollingHorizon => {
            let last = last_observed_month.unwrap_or(12);
            (last - 1 + step) % 12 + 1
        }
    }
}

/// Predict every known product over the 6-step horizon.
pub fn predict_horizon(
    model: &Mlp,
    products: &ProductIndex,
    mode: HorizonMode,
    last_observed_month: Option<u32>,
) -> Vec<PredictionEntry> {
    let mut out = Vec::with_capacity(HORIZON_MONTHS as usize * products.len());

    for step in 1..=HORIZON_MONTHS {
        let month = feature_month(mode, step, last_observed_month);
        for (idx, name) in products.iter() {
            let predicted = model.predict([month as f64, idx as f64]);
            out.push(PredictionEntry {
                product: name.to_string(),
                product_index: idx,
                month: step,
                feature_month: month,
                predicted,
            });
        }
    }

    debug!(entries = out.len(), mode = mode.label(), "generated horizon predictions");
    out
}
