//! cartpath: command-line front end for the Cartpath client core
//!
//! Wires the SDK stores to the REST backend and a SQLite mirror, for
//! exercising plans, the watchlist and deal selection from a terminal.

pub mod commands;
pub mod config;

pub use commands::{execute_command, App, Commands};
pub use config::Config;
