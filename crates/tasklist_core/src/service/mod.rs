//! Use-case layer between the presentation shell and the task store.
//!
//! # Responsibility
//! - Route user intents to the store and keep the displayed list in sync.
//! - Describe the text-entry dialog without depending on any UI toolkit.

pub mod prompt;
pub mod task_list;
pub mod view;
