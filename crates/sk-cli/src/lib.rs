//! Slot keeper CLI library.
//!
//! This crate provides the CLI interface for slot reconciliation.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
