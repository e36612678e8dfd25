//! Document/content value model.
//!
//! # Responsibility
//! - Define canonical data structures shared by repositories and services.
//! - Keep validation rules next to the shapes they guard.
//!
//! # Invariants
//! - Every document is identified by a stable `DocumentId`.
//! - Deletion is represented by soft-delete tombstones, not hard delete.
//! - Revision ordinals are gap-free and start at 0.

pub mod content;
pub mod document;
pub mod query;
pub mod validation;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
