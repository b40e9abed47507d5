//! Fixed-epoch training loop.
//!
//! Training always runs exactly `epochs` passes over the data: there is no
//! validation split, no early stopping, and no convergence check. Each pass
//! walks the rows in order (one full-batch step by default, or consecutive
//! mini-batches when `batch_size` is set).

use nalgebra::{DMatrix, DVector};
use tracing::{debug, error, info, warn};

use crate::domain::{FeaturePair, ForecastConfig};
use crate::error::AppError;
use crate::fit::adam::Adam;
use crate::models::{INPUT_DIM, Mlp};

/// Options consumed by `train`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOptions {
    pub epochs: usize,
    pub learning_rate: f64,
    pub batch_size: Option<usize>,
}

impl From<&ForecastConfig> for TrainOptions {
    fn from(config: &ForecastConfig) -> Self {
        Self {
            epochs: config.epochs,
            learning_rate: config.learning_rate,
            batch_size: config.batch_size,
        }
    }
}

/// What happened during one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub epochs: usize,
    pub samples: usize,
    pub optimizer_steps: usize,
    /// Sample-weighted mean batch loss per epoch.
    pub loss_history: Vec<f64>,
}

impl TrainingReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.loss_history.last().copied()
    }
}

/// Fit `model` to `(inputs, outputs)`.
///
/// Returns `Ok(None)` (after logging) when there is nothing to train on.
pub fn train(
    model: &mut Mlp,
    inputs: &[FeaturePair],
    outputs: &[f64],
    opts: TrainOptions,
) -> Result<Option<TrainingReport>, AppError> {
    if inputs.is_empty() || outputs.is_empty() {
        error!(
            inputs = inputs.len(),
            outputs = outputs.len(),
            "no training data after preprocessing; skipping training"
        );
        return Ok(None);
    }
    if inputs.len() != outputs.len() {
        return Err(AppError::runtime(format!(
            "Training inputs ({}) and outputs ({}) differ in length.",
            inputs.len(),
            outputs.len()
        )));
    }

    let n = inputs.len();
    let x = DMatrix::from_fn(n, INPUT_DIM, |i, j| inputs[i].as_input()[j]);
    let y = DVector::from_column_slice(outputs);
    let batch = opts.batch_size.unwrap_or(n).clamp(1, n);

    let mut optimizer = Adam::new(opts.learning_rate);
    let mut loss_history = Vec::new();

    for epoch in 0..opts.epochs {
        let mut weighted_loss = 0.0;
        let mut start = 0;
        while start < n {
            let len = batch.min(n - start);
            let (loss, grads) = if len == n {
                model.loss_and_gradients(&x, &y)
            } else {
                let xb = x.rows(start, len).into_owned();
                let yb = y.rows(start, len).into_owned();
                model.loss_and_gradients(&xb, &yb)
            };
            optimizer.step(&mut model.params_mut(), &grads.slices());
            weighted_loss += loss * len as f64;
            start += len;
        }

        let epoch_loss = weighted_loss / n as f64;
        if !epoch_loss.is_finite() {
            warn!(epoch = epoch + 1, "training loss is not finite");
        }
        debug!(epoch = epoch + 1, loss = epoch_loss, "epoch complete");
        loss_history.push(epoch_loss);
    }

    let report = TrainingReport {
        epochs: opts.epochs,
        samples: n,
        optimizer_steps: optimizer.steps(),
        loss_history,
    };
    info!(
        epochs = report.epochs,
        samples = report.samples,
        final_loss = report.final_loss().unwrap_or(f64::NAN),
        "training finished"
    );
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs() -> (Vec<FeaturePair>, Vec<f64>) {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for month in 1..=6 {
            for product in 0..2 {
                inputs.push(FeaturePair { month, product });
                outputs.push(5.0 + month as f64 + 10.0 * product as f64);
            }
        }
        (inputs, outputs)
    }

    fn opts(epochs: usize, batch_size: Option<usize>) -> TrainOptions {
        TrainOptions {
            epochs,
            learning_rate: 0.01,
            batch_size,
        }
    }

    #[test]
    fn runs_exactly_the_requested_epochs() {
        let (inputs, outputs) = pairs();
        let mut model = Mlp::seeded(10, Some(1));
        let report = train(&mut model, &inputs, &outputs, opts(50, None)).unwrap().unwrap();

        assert_eq!(report.epochs, 50);
        assert_eq!(report.loss_history.len(), 50);
        assert_eq!(report.optimizer_steps, 50);
        assert_eq!(report.samples, 12);
    }

    #[test]
    fn mini_batches_take_more_steps() {
        let (inputs, outputs) = pairs();
        let mut model = Mlp::seeded(10, Some(1));
        let report = train(&mut model, &inputs, &outputs, opts(3, Some(5))).unwrap().unwrap();
        // 12 rows in batches of 5 → 3 steps per epoch.
        assert_eq!(report.optimizer_steps, 9);
    }

    #[test]
    fn loss_decreases_on_learnable_data() {
        let (inputs, outputs) = pairs();
        let mut model = Mlp::seeded(10, Some(11));
        let report = train(&mut model, &inputs, &outputs, opts(300, None)).unwrap().unwrap();
        let first = report.loss_history[0];
        let last = report.final_loss().unwrap();
        assert!(last < first, "loss went from {first} to {last}");
    }

    #[test]
    fn empty_data_aborts_without_error() {
        let mut model = Mlp::seeded(10, Some(1));
        let before = model.clone();
        assert!(train(&mut model, &[], &[], opts(50, None)).unwrap().is_none());
        assert_eq!(model, before);
    }

    #[test]
    fn seeded_training_is_deterministic() {
        let (inputs, outputs) = pairs();
        let mut a = Mlp::seeded(10, Some(5));
        let mut b = Mlp::seeded(10, Some(5));
        train(&mut a, &inputs, &outputs, opts(20, None)).unwrap();
        train(&mut b, &inputs, &outputs, opts(20, None)).unwrap();
        assert_eq!(a, b);
    }
}
