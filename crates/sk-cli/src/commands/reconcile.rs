//! Reconcile command: applies a batch of submitted slots for one customer.
//!
//! Submitted slots are read as a JSON array, e.g.
//!
//! ```json
//! [
//!   {"name": "morning", "start": "08:00", "end": "12:00", "isExisting": false},
//!   {"id": 5, "name": "late", "start": "22:00", "end": "02:00", "isExisting": true}
//! ]
//! ```

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use sk_core::{ReconciliationResult, SlotInput, format_duration, reconcile};

use super::util::{PackageArgs, open_database};
use crate::Config;

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Customer whose slots are reconciled.
    #[arg(long)]
    pub customer: String,

    #[command(flatten)]
    pub package: PackageArgs,

    /// JSON file with the submitted slots. Reads stdin when omitted.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output the result as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write, R: Read>(
    writer: &mut W,
    stdin: R,
    args: &ReconcileArgs,
    config: &Config,
) -> Result<()> {
    let package = args.package.resolve(config)?;
    let inputs = read_inputs(args.input.as_deref(), stdin)?;
    tracing::debug!(customer = %args.customer, slots = inputs.len(), "read submitted slots");

    let mut db = open_database(config)?;
    let result = reconcile(&mut db, &package, &inputs, &args.customer);

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        write_summary(writer, &args.customer, &result)?;
    }

    if !result.success {
        bail!("reconciliation failed: {}", result.message);
    }
    Ok(())
}

/// Reads the submitted JSON array.
///
/// Only the document itself must be well-formed; each element is converted
/// on its own so one mistyped entry is skipped rather than failing the call.
fn read_inputs<R: Read>(path: Option<&Path>, stdin: R) -> Result<Vec<SlotInput>> {
    let values: Vec<serde_json::Value> = match path {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file)).with_context(|| {
                format!("failed to parse submitted slots from {}", path.display())
            })?
        }
        None => {
            serde_json::from_reader(stdin).context("failed to parse submitted slots from stdin")?
        }
    };
    Ok(values.into_iter().map(SlotInput::from_json).collect())
}

fn write_summary<W: Write>(
    writer: &mut W,
    customer: &str,
    result: &ReconciliationResult,
) -> Result<()> {
    let skipped = if result.success {
        writeln!(writer, "Customer {customer}: {}", result.message)?;
        result.errors.as_slice()
    } else {
        writeln!(writer, "Customer {customer}: failed: {}", result.message)?;
        // The last entry repeats the failure message.
        result.errors.split_last().map_or(&[][..], |(_, rest)| rest)
    };

    writeln!(
        writer,
        "Used {} of {}",
        format_duration(result.total_duration),
        format_duration(u64::from(result.package_duration))
    )?;

    if !skipped.is_empty() {
        writeln!(writer, "Skipped:")?;
        for error in skipped {
            writeln!(writer, "- {error}")?;
        }
    }
    Ok(())
}
