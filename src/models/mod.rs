//! Forecast model implementation.
//!
//! The regressor is implemented as a small, self-contained type so that the
//! trainer (`fit`) and the prediction loop (`forecast`) can stay generic over
//! plain parameter slices.

pub mod mlp;

pub use mlp::*;
