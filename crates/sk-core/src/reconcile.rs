//! Slot reconciliation.
//!
//! Compares the slots a customer just submitted against the slots already
//! stored for them, decides per slot whether to keep, update or create it,
//! and commits the resulting writes only if the whole batch fits within the
//! package's daily allowance.
//!
//! # Stages
//!
//! 1. Normalize the package window and every submitted slot. Malformed slots
//!    are skipped and reported; they never abort the batch.
//! 2. Classify each valid slot with [`classify`] and sum all slot durations.
//! 3. If the sum exceeds the package allowance, stop without writing.
//! 4. Otherwise hand creates and updates to [`SlotStore::commit`], which must
//!    apply them all-or-nothing.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::slot::{
    PackageInput, PackageWindow, SlotId, SlotIdentity, SlotInput, StoredSlot, SubmittedSlot,
};
use crate::time::{InvalidTimeFormat, TimeOfDay};

/// Persistence capability the reconciler needs.
///
/// Implemented by the SQLite layer and by in-memory fixtures in tests.
pub trait SlotStore {
    type Error: std::error::Error;

    /// Looks up a slot owned by `customer_id`. Rows owned by other customers
    /// are reported as absent.
    fn find(&self, customer_id: &str, id: SlotId) -> Result<Option<StoredSlot>, Self::Error>;

    /// Applies every update and create in `plan` atomically.
    ///
    /// On error, no write from `plan` may be observable afterwards.
    fn commit(&mut self, plan: &WritePlan) -> Result<(), Self::Error>;
}

/// Outcome of classifying one submitted slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Stored row already matches; no write.
    Keep(SlotId),
    /// Overwrite the stored row.
    Update(SlotId),
    /// Insert a new row.
    Create,
}

/// Decides what to do with one submitted slot.
///
/// `stored` is the row found for the slot's `ExistingRef` id, if any. A stored
/// row is kept only when its times already equal the submitted ones and its own
/// duration fits within `package_seconds`.
#[must_use]
pub fn classify(
    submitted: &SubmittedSlot,
    stored: Option<&StoredSlot>,
    package_seconds: u32,
) -> Decision {
    let SlotIdentity::ExistingRef(_) = submitted.identity else {
        return Decision::Create;
    };
    let Some(stored) = stored else {
        return Decision::Create;
    };

    let fits = stored.duration_seconds() <= package_seconds;
    let unchanged = stored.start == submitted.start && stored.end == submitted.end;
    if fits && unchanged {
        Decision::Keep(stored.id)
    } else {
        Decision::Update(stored.id)
    }
}

/// A slot row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    pub name: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// A full overwrite of an existing slot row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotUpdate {
    pub id: SlotId,
    pub name: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// Writes decided for one customer in one reconciliation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WritePlan {
    pub customer_id: String,
    pub creates: Vec<NewSlot>,
    pub updates: Vec<SlotUpdate>,
}

impl WritePlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.creates.len() + self.updates.len()
    }
}

/// Classification of a whole batch, before anything is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub writes: WritePlan,
    pub kept: Vec<SlotId>,
    /// One message per skipped slot.
    pub skipped: Vec<String>,
    /// Summed duration of every valid slot, kept ones included.
    pub total_seconds: u64,
    pub package_seconds: u32,
}

impl BatchPlan {
    /// Fails when the valid slots together need more time than the package
    /// allows.
    pub fn check_capacity(&self) -> Result<(), SlotError> {
        if self.total_seconds > u64::from(self.package_seconds) {
            return Err(SlotError::CapacityExceeded {
                total_seconds: self.total_seconds,
                package_seconds: self.package_seconds,
            });
        }
        Ok(())
    }
}

/// Batch-level failures.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("invalid package window: {0}")]
    InvalidPackageWindow(#[source] InvalidTimeFormat),
    #[error(
        "total slot duration of {total_seconds}s exceeds the package allowance of {package_seconds}s"
    )]
    CapacityExceeded {
        total_seconds: u64,
        package_seconds: u32,
    },
    #[error("{0}")]
    Persistence(String),
}

/// A batch whose classification stopped at a failing lookup.
///
/// `partial` holds everything gathered before the failure, so skipped-slot
/// messages collected earlier in the batch are not lost.
#[derive(Debug)]
pub struct PlanAborted {
    pub error: SlotError,
    pub partial: BatchPlan,
}

/// Structured outcome of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub success: bool,
    pub message: String,
    /// Stored slots left untouched because they already matched.
    pub valid_existing_count: usize,
    /// Slots created or updated.
    pub processed_count: usize,
    pub errors: Vec<String>,
    pub total_duration: u64,
    pub package_duration: u32,
}

/// Classifies a batch of submitted slots against `store` without writing.
///
/// Per-slot problems are collected in [`BatchPlan::skipped`]. Only a failing
/// lookup aborts classification, returning the plan built so far; capacity is
/// checked separately with [`BatchPlan::check_capacity`].
pub fn plan_batch<S: SlotStore>(
    store: &S,
    window: PackageWindow,
    inputs: &[SlotInput],
    customer_id: &str,
) -> Result<BatchPlan, PlanAborted> {
    let mut plan = BatchPlan {
        writes: WritePlan {
            customer_id: customer_id.to_string(),
            ..WritePlan::default()
        },
        package_seconds: window.allowed_seconds(),
        ..BatchPlan::default()
    };

    debug!(customer_id, slots = inputs.len(), "normalizing");
    for (index, input) in inputs.iter().enumerate() {
        let submitted = match input.to_submitted() {
            Ok(submitted) => submitted,
            Err(err) => {
                let label = input.label(index);
                warn!(customer_id, slot = %label, error = %err, "skipping slot");
                plan.skipped.push(format!("{label}: {err}"));
                continue;
            }
        };

        let stored = match submitted.identity {
            SlotIdentity::New => None,
            SlotIdentity::ExistingRef(id) => {
                let found = match store.find(customer_id, id) {
                    Ok(found) => found,
                    Err(err) => {
                        return Err(PlanAborted {
                            error: SlotError::Persistence(err.to_string()),
                            partial: plan,
                        });
                    }
                };
                if found.is_none() {
                    warn!(
                        customer_id,
                        slot_id = id,
                        name = %submitted.name,
                        "submitted slot references a missing row; creating it"
                    );
                }
                found
            }
        };

        plan.total_seconds += u64::from(submitted.duration_seconds());
        let decision = classify(&submitted, stored.as_ref(), plan.package_seconds);
        debug!(name = %submitted.name, ?decision, "classified");
        match decision {
            Decision::Keep(id) => plan.kept.push(id),
            Decision::Update(id) => plan.writes.updates.push(SlotUpdate {
                id,
                name: submitted.name,
                start: submitted.start,
                end: submitted.end,
            }),
            Decision::Create => plan.writes.creates.push(NewSlot {
                name: submitted.name,
                start: submitted.start,
                end: submitted.end,
            }),
        }
    }

    Ok(plan)
}

/// Reconciles a customer's submitted slots with their stored slots.
///
/// Never fails outright: every outcome, including capacity and persistence
/// errors, is reported through the returned [`ReconciliationResult`].
pub fn reconcile<S: SlotStore>(
    store: &mut S,
    package: &PackageInput,
    inputs: &[SlotInput],
    customer_id: &str,
) -> ReconciliationResult {
    let window = match PackageWindow::parse(&package.start, &package.end) {
        Ok(window) => window,
        Err(err) => return failed(&SlotError::InvalidPackageWindow(err), Vec::new(), 0, 0),
    };

    let plan = match plan_batch(store, window, inputs, customer_id) {
        Ok(plan) => plan,
        Err(PlanAborted { error, partial }) => {
            warn!(customer_id, error = %error, "slot lookup failed");
            return failed(
                &error,
                partial.skipped,
                partial.total_seconds,
                partial.package_seconds,
            );
        }
    };

    if let Err(err) = plan.check_capacity() {
        warn!(customer_id, error = %err, "reconciliation aborted");
        return failed(&err, plan.skipped, plan.total_seconds, plan.package_seconds);
    }

    if plan.writes.is_empty() {
        debug!(customer_id, "nothing to write");
    } else {
        debug!(customer_id, writes = plan.writes.len(), "committing");
        if let Err(err) = store.commit(&plan.writes) {
            let err = SlotError::Persistence(err.to_string());
            warn!(customer_id, error = %err, "commit failed; rolled back");
            return failed(&err, plan.skipped, plan.total_seconds, plan.package_seconds);
        }
    }

    let processed = plan.writes.len();
    let kept = plan.kept.len();
    info!(
        customer_id,
        created = plan.writes.creates.len(),
        updated = plan.writes.updates.len(),
        kept,
        skipped = plan.skipped.len(),
        "committed"
    );

    let message = if plan.skipped.is_empty() {
        format!("{processed} slot(s) saved, {kept} unchanged")
    } else {
        format!(
            "{processed} slot(s) saved, {kept} unchanged, {} skipped",
            plan.skipped.len()
        )
    };

    ReconciliationResult {
        success: true,
        message,
        valid_existing_count: kept,
        processed_count: processed,
        errors: plan.skipped,
        total_duration: plan.total_seconds,
        package_duration: plan.package_seconds,
    }
}

fn failed(
    err: &SlotError,
    mut errors: Vec<String>,
    total_duration: u64,
    package_duration: u32,
) -> ReconciliationResult {
    let message = err.to_string();
    errors.push(message.clone());
    ReconciliationResult {
        success: false,
        message,
        valid_existing_count: 0,
        processed_count: 0,
        errors,
        total_duration,
        package_duration,
    }
}
