//! Persistence contracts for tasks.
//!
//! # Responsibility
//! - Define the `TaskStore` contract used by the list controller.
//! - Keep SQL details out of the controller.
//!
//! # Invariants
//! - Store APIs report unknown records as `NotFound`, separate from I/O errors.
//! - Mutations are staged until `flush`; nothing is committed implicitly.

pub mod task_store;
