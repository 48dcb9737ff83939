//! Core domain logic for daily slot reconciliation.
//!
//! This crate contains:
//! - Time normalization: canonical `HH:MM:SS` times of day
//! - Duration arithmetic that wraps past midnight
//! - Slot reconciliation: keep/update/create decisions under a daily package budget

pub mod reconcile;
pub mod slot;
pub mod time;

pub use reconcile::{
    BatchPlan, Decision, NewSlot, PlanAborted, ReconciliationResult, SlotError, SlotStore,
    SlotUpdate, WritePlan, classify, plan_batch, reconcile,
};
pub use slot::{
    PackageInput, PackageWindow, SlotId, SlotIdentity, SlotInput, SlotInputError, StoredSlot,
    SubmittedSlot,
};
pub use time::{InvalidTimeFormat, SECONDS_PER_DAY, TimeOfDay, duration, format_duration};
