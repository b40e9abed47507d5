//! Model training.
//!
//! Public API:
//! - `adam::Adam` (optimizer over flat parameter slices)
//! - `trainer::train` (fixed-epoch MSE training of an `Mlp`)

pub mod adam;
pub mod trainer;

pub use trainer::{TrainOptions, TrainingReport, train};
