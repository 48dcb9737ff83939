//! CLI subcommand implementations.

pub mod list;
pub mod packages;
pub mod reconcile;
pub mod usage;
pub mod util;
