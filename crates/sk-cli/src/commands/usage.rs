//! Usage command: compares a customer's stored slots with a package allowance.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use sk_core::{PackageWindow, format_duration};

use super::util::{PackageArgs, open_database};
use crate::Config;

#[derive(Debug, Args)]
pub struct UsageArgs {
    /// Customer whose slots are measured.
    #[arg(long)]
    pub customer: String,

    #[command(flatten)]
    pub package: PackageArgs,
}

pub fn run<W: Write>(writer: &mut W, args: &UsageArgs, config: &Config) -> Result<()> {
    let package = args.package.resolve(config)?;
    let window =
        PackageWindow::parse(&package.start, &package.end).context("invalid package window")?;
    let db = open_database(config)?;

    let used = db.total_duration(&args.customer)?;
    let allowed = u64::from(window.allowed_seconds());

    let remaining = if used > allowed {
        format!("over by {}", format_duration(used - allowed))
    } else {
        format!("{} remaining", format_duration(allowed - used))
    };
    writeln!(
        writer,
        "Customer {} uses {} of {} ({remaining})",
        args.customer,
        format_duration(used),
        format_duration(allowed),
    )?;
    Ok(())
}
