//! Shared utilities for CLI commands.

use anyhow::{Context, Result, bail};
use clap::Args;
use sk_core::PackageInput;
use sk_db::Database;

use crate::Config;

/// Selects a package window either by configured name or by explicit bounds.
#[derive(Debug, Clone, Default, Args)]
pub struct PackageArgs {
    /// Name of a package from the config file.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub package: Option<String>,

    /// Package window start (e.g. 08:00).
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// Package window end (e.g. 20:00).
    #[arg(long, requires = "start")]
    pub end: Option<String>,
}

impl PackageArgs {
    /// Resolves the selected window against the configured packages.
    pub fn resolve(&self, config: &Config) -> Result<PackageInput> {
        if let Some(name) = &self.package {
            return config
                .package(name)
                .cloned()
                .with_context(|| format!("unknown package: {name}"));
        }
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => Ok(PackageInput::new(start.as_str(), end.as_str())),
            _ => bail!("either --package or both --start and --end are required"),
        }
    }
}

/// Opens the configured database, creating its parent directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}
