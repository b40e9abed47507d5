//! Input/output helpers.
//!
//! - sales CSV ingest (`ingest`)
//! - prediction CSV + chart series JSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
