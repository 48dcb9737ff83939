//! List command for showing a customer's stored slots.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sk_core::{SlotId, StoredSlot, TimeOfDay, format_duration};

use super::util::open_database;
use crate::Config;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Customer whose slots are listed.
    #[arg(long)]
    pub customer: String,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Slot data for display.
#[derive(Debug, Clone, Serialize)]
pub struct SlotEntry {
    pub id: SlotId,
    pub name: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub duration_seconds: u32,
}

impl From<StoredSlot> for SlotEntry {
    fn from(slot: StoredSlot) -> Self {
        Self {
            duration_seconds: slot.duration_seconds(),
            id: slot.id,
            name: slot.name,
            start: slot.start,
            end: slot.end,
        }
    }
}

pub fn run<W: Write>(writer: &mut W, args: &ListArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let entries: Vec<SlotEntry> = db
        .list_slots(&args.customer)?
        .into_iter()
        .map(SlotEntry::from)
        .collect();

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No slots for customer {}.", args.customer)?;
        return Ok(());
    }

    writeln!(writer, "Slots for customer {}:", args.customer)?;
    for entry in &entries {
        writeln!(
            writer,
            "{:>4}  {}-{}  {:>7}  {}",
            entry.id,
            entry.start,
            entry.end,
            format_duration(u64::from(entry.duration_seconds)),
            entry.name
        )?;
    }
    Ok(())
}
