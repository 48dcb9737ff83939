//! Storage layer for customer slots.
//!
//! Provides the SQLite-backed [`SlotStore`] used by reconciliation.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization. Reconciliation calls for
//! one customer are expected to be serialized by the caller.
//!
//! # Schema
//!
//! ## Time Format
//!
//! `start_time` and `end_time` are stored as TEXT in canonical `HH:MM:SS`
//! form. Rows written by older tooling may hold other layouts (`8:00`); they
//! are normalized on read, so comparisons never depend on the stored layout.
//!
//! `created_at` / `updated_at` are RFC 3339 UTC timestamps with millisecond
//! precision (e.g., `2024-01-15T10:30:00.000Z`).

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use sk_core::{InvalidTimeFormat, SlotId, SlotStore, StoredSlot, TimeOfDay, WritePlan};
use thiserror::Error;
use tracing::{debug, warn};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored time value could not be normalized.
    #[error("invalid stored time for slot {slot_id}: {source}")]
    InvalidStoredTime {
        slot_id: SlotId,
        #[source]
        source: InvalidTimeFormat,
    },
    /// An update targeted a row that does not exist.
    #[error("slot {0} not found")]
    SlotNotFound(SlotId),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Rows written by one successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub created_ids: Vec<SlotId>,
    pub updated: usize,
}

#[derive(Debug)]
struct SlotRow {
    id: SlotId,
    customer_id: String,
    name: String,
    start_time: String,
    end_time: String,
}

impl SlotRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            customer_id: row.get(1)?,
            name: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
        })
    }

    fn into_stored(self) -> Result<StoredSlot, DbError> {
        let parse = |value: &str| {
            TimeOfDay::parse(value).map_err(|source| DbError::InvalidStoredTime {
                slot_id: self.id,
                source,
            })
        };
        let start = parse(&self.start_time)?;
        let end = parse(&self.end_time)?;
        Ok(StoredSlot {
            id: self.id,
            customer_id: self.customer_id,
            name: self.name,
            start,
            end,
        })
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- slots: recurring daily reservations, one customer per row
            -- start_time/end_time: canonical 'HH:MM:SS'
            CREATE TABLE IF NOT EXISTS slots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id TEXT NOT NULL,
                name TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_slots_customer ON slots(customer_id);
            ",
        )?;
        Ok(())
    }

    /// Inserts a single slot outside of reconciliation.
    pub fn insert_slot(
        &mut self,
        customer_id: &str,
        name: &str,
        start: TimeOfDay,
        end: TimeOfDay,
    ) -> Result<SlotId, DbError> {
        let now = format_timestamp_now();
        self.conn.execute(
            "
            INSERT INTO slots (customer_id, name, start_time, end_time, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![customer_id, name, start.to_string(), end.to_string(), now, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Looks up one slot owned by `customer_id`.
    pub fn find_slot(&self, customer_id: &str, id: SlotId) -> Result<Option<StoredSlot>, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT id, customer_id, name, start_time, end_time
                FROM slots
                WHERE id = ? AND customer_id = ?
                ",
                params![id, customer_id],
                SlotRow::from_row,
            )
            .optional()?;
        row.map(SlotRow::into_stored).transpose()
    }

    /// Lists a customer's slots ordered by start time then ID.
    pub fn list_slots(&self, customer_id: &str) -> Result<Vec<StoredSlot>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, customer_id, name, start_time, end_time
            FROM slots
            WHERE customer_id = ?
            ",
        )?;
        let rows = stmt.query_map([customer_id], SlotRow::from_row)?;
        let mut slots = Vec::new();
        for row in rows {
            slots.push(row?.into_stored()?);
        }
        slots.sort_by_key(|slot| (slot.start, slot.id));
        Ok(slots)
    }

    /// Sum of all stored slot durations for a customer, in seconds.
    pub fn total_duration(&self, customer_id: &str) -> Result<u64, DbError> {
        Ok(self
            .list_slots(customer_id)?
            .iter()
            .map(|slot| u64::from(slot.duration_seconds()))
            .sum())
    }

    /// Applies a reconciliation write plan in a single transaction.
    ///
    /// Updates are applied first, then creates. If any statement fails the
    /// transaction is rolled back and the original error is returned; none of
    /// the plan's writes remain visible.
    pub fn commit_plan(&mut self, plan: &WritePlan) -> Result<CommitSummary, DbError> {
        let now = format_timestamp_now();
        let tx = self.conn.transaction()?;
        let applied = apply_plan(&tx, plan, &now);
        match applied {
            Ok(summary) => {
                tx.commit()?;
                debug!(
                    customer_id = %plan.customer_id,
                    created = summary.created_ids.len(),
                    updated = summary.updated,
                    "slot writes committed"
                );
                Ok(summary)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

fn apply_plan(tx: &Transaction<'_>, plan: &WritePlan, now: &str) -> Result<CommitSummary, DbError> {
    let mut summary = CommitSummary::default();
    {
        let mut update_stmt = tx.prepare(
            "
            UPDATE slots
            SET customer_id = ?, name = ?, start_time = ?, end_time = ?, updated_at = ?
            WHERE id = ?
            ",
        )?;
        for update in &plan.updates {
            let changed = update_stmt.execute(params![
                plan.customer_id,
                update.name,
                update.start.to_string(),
                update.end.to_string(),
                now,
                update.id,
            ])?;
            if changed == 0 {
                return Err(DbError::SlotNotFound(update.id));
            }
            summary.updated += 1;
        }
    }
    {
        let mut insert_stmt = tx.prepare(
            "
            INSERT INTO slots (customer_id, name, start_time, end_time, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )?;
        for create in &plan.creates {
            let id = insert_stmt.insert(params![
                plan.customer_id,
                create.name,
                create.start.to_string(),
                create.end.to_string(),
                now,
                now,
            ])?;
            summary.created_ids.push(id);
        }
    }
    Ok(summary)
}

impl SlotStore for Database {
    type Error = DbError;

    fn find(&self, customer_id: &str, id: SlotId) -> Result<Option<StoredSlot>, DbError> {
        self.find_slot(customer_id, id)
    }

    fn commit(&mut self, plan: &WritePlan) -> Result<(), DbError> {
        self.commit_plan(plan).map(|_| ())
    }
}

fn format_timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
