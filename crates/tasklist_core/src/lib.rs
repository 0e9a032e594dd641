//! Core logic for the TaskList app.
//! Owns task persistence and the list state the UI shell renders.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::task::{Task, TaskId};
pub use repo::task_store::{SqliteTaskStore, StoreError, StoreResult, TaskStore};
pub use service::prompt::{
    PromptResponse, PromptTarget, TaskIntent, TaskPrompt, CANCEL_ACTION_LABEL, SAVE_ACTION_LABEL,
    SCREEN_TITLE,
};
pub use service::task_list::{ControllerError, ControllerResult, TaskListController};
pub use service::view::{ListChange, TaskListView};

/// Minimal health-check API for shell integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
