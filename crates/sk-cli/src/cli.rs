//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{list::ListArgs, reconcile::ReconcileArgs, usage::UsageArgs};

/// Daily slot keeper.
///
/// Reconciles a customer's recurring daily time slots against the duration
/// allowed by their subscription package.
#[derive(Debug, Parser)]
#[command(name = "sk", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile submitted slots for a customer and save the result.
    Reconcile(ReconcileArgs),

    /// List a customer's stored slots.
    List(ListArgs),

    /// Show how much of a package a customer's stored slots use.
    Usage(UsageArgs),

    /// List configured packages.
    Packages,
}
