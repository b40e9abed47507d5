//! Two-layer perceptron regressor.
//!
//! `(month, product-index)` → dense(hidden, ReLU) → dense(1, linear) → quantity.
//!
//! The model exposes three primitive operations:
//! - evaluate a single input (prediction loop)
//! - compute full-batch MSE loss + gradients (training)
//! - flat mutable views of its parameters (optimizer updates)

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};

use crate::error::AppError;

/// Number of input features: month and product index.
pub const INPUT_DIM: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Mlp {
    /// Hidden kernel, `hidden × INPUT_DIM`.
    w1: DMatrix<f64>,
    b1: DVector<f64>,
    /// Output kernel, one weight per hidden unit.
    w2: DVector<f64>,
    b2: f64,
}

/// Parameter gradients, shaped like the model.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub w1: DMatrix<f64>,
    pub b1: DVector<f64>,
    pub w2: DVector<f64>,
    pub b2: f64,
}

impl Gradients {
    pub fn slices(&self) -> [&[f64]; 4] {
        [
            self.w1.as_slice(),
            self.b1.as_slice(),
            self.w2.as_slice(),
            std::slice::from_ref(&self.b2),
        ]
    }
}

impl Mlp {
    /// Glorot-uniform kernels, zero biases.
    pub fn new<R: Rng + ?Sized>(hidden: usize, rng: &mut R) -> Self {
        let hidden = hidden.max(1);
        let w1 = DMatrix::from_fn(hidden, INPUT_DIM, |_, _| glorot(INPUT_DIM, hidden).sample(&mut *rng));
        let w2 = DVector::from_fn(hidden, |_, _| glorot(hidden, 1).sample(&mut *rng));
        Self {
            w1,
            b1: DVector::zeros(hidden),
            w2,
            b2: 0.0,
        }
    }

    /// Build a freshly initialized model, reproducible when `seed` is given.
    pub fn seeded(hidden: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(hidden, &mut rng)
    }

    /// Assemble a model from explicit weights.
    pub fn from_parts(w1: DMatrix<f64>, b1: DVector<f64>, w2: DVector<f64>, b2: f64) -> Result<Self, AppError> {
        let hidden = w1.nrows();
        if hidden == 0 || w1.ncols() != INPUT_DIM || b1.len() != hidden || w2.len() != hidden {
            return Err(AppError::runtime(format!(
                "Inconsistent model shapes: w1={}x{}, b1={}, w2={}",
                w1.nrows(),
                w1.ncols(),
                b1.len(),
                w2.len()
            )));
        }
        Ok(Self { w1, b1, w2, b2 })
    }

    pub fn hidden_units(&self) -> usize {
        self.w1.nrows()
    }

    pub fn param_count(&self) -> usize {
        self.w1.len() + self.b1.len() + self.w2.len() + 1
    }

    /// Evaluate one input. Works entirely on the stack; nothing outlives the call.
    pub fn predict(&self, input: [f64; INPUT_DIM]) -> f64 {
        let mut out = self.b2;
        for j in 0..self.hidden_units() {
            let z = self.w1[(j, 0)] * input[0] + self.w1[(j, 1)] * input[1] + self.b1[j];
            out += self.w2[j] * relu(z);
        }
        out
    }

    /// Forward pass over a batch (`n × INPUT_DIM`).
    ///
    /// Returns the hidden pre-activations, hidden activations, and outputs.
    fn forward(&self, x: &DMatrix<f64>) -> (DMatrix<f64>, DMatrix<f64>, DVector<f64>) {
        let mut z = x * self.w1.transpose();
        for i in 0..z.nrows() {
            for j in 0..z.ncols() {
                z[(i, j)] += self.b1[j];
            }
        }
        let a = z.map(relu);
        let mut y_hat = &a * &self.w2;
        y_hat.add_scalar_mut(self.b2);
        (z, a, y_hat)
    }

    /// Mean squared error and its gradients for one batch.
    pub fn loss_and_gradients(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> (f64, Gradients) {
        let n = x.nrows().max(1) as f64;
        let (z, a, y_hat) = self.forward(x);

        let err = y_hat - y;
        let loss = err.norm_squared() / n;

        // dL/dŷ
        let d_out = err * (2.0 / n);

        let w2 = a.tr_mul(&d_out);
        let b2 = d_out.sum();

        let mut d_hidden = &d_out * self.w2.transpose();
        for i in 0..d_hidden.nrows() {
            for j in 0..d_hidden.ncols() {
                if z[(i, j)] <= 0.0 {
                    d_hidden[(i, j)] = 0.0;
                }
            }
        }

        let w1 = d_hidden.tr_mul(x);
        let b1 = d_hidden.row_sum().transpose();

        (loss, Gradients { w1, b1, w2, b2 })
    }

    /// Mean squared error over a batch without gradients.
    pub fn loss(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> f64 {
        let n = x.nrows().max(1) as f64;
        let (_, _, y_hat) = self.forward(x);
        (y_hat - y).norm_squared() / n
    }

    /// Flat mutable parameter views, in the same order as `Gradients::slices`.
    pub fn params_mut(&mut self) -> [&mut [f64]; 4] {
        [
            self.w1.as_mut_slice(),
            self.b1.as_mut_slice(),
            self.w2.as_mut_slice(),
            std::slice::from_mut(&mut self.b2),
        ]
    }
}

fn relu(v: f64) -> f64 {
    v.max(0.0)
}

fn glorot(fan_in: usize, fan_out: usize) -> Uniform<f64> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Uniform::new_inclusive(-limit, limit)
}

/// Stack feature rows into a design matrix.
pub fn design_matrix(rows: &[[f64; INPUT_DIM]]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), INPUT_DIM, |i, j| rows[i][j])
}
