//! Task domain model.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Tasks are hard-deleted; there are no tombstones.

pub mod task;
