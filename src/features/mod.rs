//! Feature building: uploaded records → `(month, product-index) → quantity`.
//!
//! - lenient date parsing (`dates`)
//! - first-seen product mapping (`products`)
//! - single-pass input/output construction + monthly actuals (`builder`)

pub mod builder;
pub mod dates;
pub mod products;

pub use builder::*;
pub use dates::*;
pub use products::*;
