//! `sales-forecast` library crate.
//!
//! The binary (`forecast`) is a thin wrapper around this library so that:
//!
//! - the CSV → features → model → predictions → chart pipeline is testable
//!   without spawning processes or a terminal
//! - the CLI and the TUI share one workflow (`app::pipeline`)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod chart;
pub mod cli;
pub mod debug;
pub mod domain;
pub mod error;
pub mod features;
pub mod fit;
pub mod forecast;
pub mod io;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
