//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run configuration (`ForecastConfig`, `InvalidValuePolicy`, `HorizonMode`)
//! - uploaded rows (`SalesRecord`) and model inputs (`FeaturePair`)
//! - forecast outputs (`PredictionEntry`) and presentation filters (`ChartOptions`)

pub mod types;

pub use types::*;
