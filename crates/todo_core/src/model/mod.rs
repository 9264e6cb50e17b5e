//! Domain model for users and their todo items.
//!
//! # Responsibility
//! - Define the canonical entities and value objects used by services.
//! - Keep every invariant behind constructors and patch operations.
//!
//! # Invariants
//! - Entities are never constructed in a partially valid state.
//! - `Todo::completed_at` is set iff `Todo::completed` is true.
//! - `Todo::owner_id` never changes after creation.

pub mod todo;
pub mod user;
pub mod values;

use chrono::{DateTime, SubsecRound, Utc};

/// Returns the current UTC time truncated to the millisecond precision
/// used by storage.
pub fn now_utc() -> DateTime<Utc> {
    storage_precision(Utc::now())
}

/// Truncates `at` to whole milliseconds.
pub fn storage_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}
