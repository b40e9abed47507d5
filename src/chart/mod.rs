//! Chart presenter: predictions (+ optional actuals) → per-product series.

pub mod palette;
pub mod series;

pub use palette::*;
pub use series::*;
