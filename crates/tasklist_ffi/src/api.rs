//! FFI use-case API for the Flutter task list screen.
//!
//! # Responsibility
//! - Expose list load and add/rename/remove intents to Dart via FRB.
//! - Translate core results into flat, UI-ready envelopes.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Every mutating call returns the full committed list, so Dart never
//!   renders uncommitted state.

use log::warn;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::OnceLock;
use tasklist_core::db::open_db;
use tasklist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ControllerResult, ListChange, SqliteTaskStore, Task, TaskIntent, TaskListController,
    TaskListView, TaskPrompt, CANCEL_ACTION_LABEL, SAVE_ACTION_LABEL, SCREEN_TITLE,
};

const DB_FILE_NAME: &str = "tasklist.sqlite3";
const DB_PATH_ENV: &str = "TASKLIST_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.trim()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One row of the task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    /// Stable task ID in string form.
    pub task_id: String,
    pub title: String,
}

/// List envelope returned by every list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    /// Whether the requested intent was applied.
    pub ok: bool,
    /// Committed rows in display order; on failure the rows as they were.
    pub items: Vec<TaskItem>,
    /// Row to animate (`insert|reload|delete` per `change`), if any.
    pub changed_index: Option<u32>,
    /// `reloaded|inserted|changed|removed|none`.
    pub change: String,
    /// Human-readable message; the user-visible notice on failure.
    pub message: String,
}

/// Text-entry dialog contents for the add and edit flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPromptResponse {
    pub ok: bool,
    pub screen_title: String,
    pub heading: String,
    pub message: String,
    pub placeholder: String,
    pub initial_text: Option<String>,
    pub save_label: String,
    pub cancel_label: String,
}

/// Loads the committed task list.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list_load() -> TaskListResponse {
    with_controller("task_list_load", |controller| controller.load())
}

/// Appends a task with `title` (kept verbatim, may be empty).
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(title: String) -> TaskListResponse {
    run_intent("task_add", TaskIntent::Add { title })
}

/// Renames the task at row `index`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_rename(index: u32, title: String) -> TaskListResponse {
    run_intent(
        "task_rename",
        TaskIntent::Rename {
            index: index as usize,
            title,
        },
    )
}

/// Deletes the task at row `index`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_remove(index: u32) -> TaskListResponse {
    run_intent(
        "task_remove",
        TaskIntent::Remove {
            index: index as usize,
        },
    )
}

/// Dialog for the add button.
#[flutter_rust_bridge::frb(sync)]
pub fn task_prompt_new() -> TaskPromptResponse {
    to_prompt_response(&TaskPrompt::new_task())
}

/// Dialog for tapping row `index`, prefilled with its title.
#[flutter_rust_bridge::frb(sync)]
pub fn task_prompt_edit(index: u32) -> TaskPromptResponse {
    let prompt = open_connection().and_then(|conn| {
        let store = SqliteTaskStore::try_new(&conn).map_err(|err| err.to_string())?;
        let mut controller = TaskListController::headless(store);
        controller.load().map_err(|err| err.to_string())?;
        controller
            .prompt_edit_task(index as usize)
            .map_err(|err| err.to_string())
    });

    match prompt {
        Ok(prompt) => to_prompt_response(&prompt),
        Err(message) => {
            warn!("event=ffi_call module=ffi status=error call=task_prompt_edit");
            TaskPromptResponse {
                ok: false,
                message,
                ..to_prompt_response(&TaskPrompt::new_task())
            }
        }
    }
}

/// Collects the last notice raised by the controller.
#[derive(Default)]
struct NoticeSink {
    notice: Option<String>,
}

impl TaskListView for NoticeSink {
    fn show_notice(&mut self, notice: &str) {
        self.notice = Some(notice.to_string());
    }
}

fn run_intent(call: &'static str, intent: TaskIntent) -> TaskListResponse {
    with_controller(call, |controller| {
        controller.load()?;
        controller.apply(intent)
    })
}

fn with_controller(
    call: &'static str,
    f: impl FnOnce(
        &mut TaskListController<SqliteTaskStore<'_>, &mut NoticeSink>,
    ) -> ControllerResult<ListChange>,
) -> TaskListResponse {
    let conn = match open_connection() {
        Ok(conn) => conn,
        Err(message) => return failure(call, Vec::new(), message),
    };
    let store = match SqliteTaskStore::try_new(&conn) {
        Ok(store) => store,
        Err(err) => return failure(call, Vec::new(), format!("{call} failed: {err}")),
    };

    let mut sink = NoticeSink::default();
    let mut controller = TaskListController::new(store, &mut sink);
    let outcome = f(&mut controller);
    let items: Vec<TaskItem> = controller.tasks().iter().map(to_task_item).collect();
    drop(controller);

    match outcome {
        Ok(change) => TaskListResponse {
            ok: true,
            items,
            changed_index: change.index().map(|index| index as u32),
            change: change_label(Some(change)).to_string(),
            message: String::new(),
        },
        Err(err) => {
            let message = sink.notice.unwrap_or_else(|| format!("{call} failed: {err}"));
            failure(call, items, message)
        }
    }
}

fn open_connection() -> Result<Connection, String> {
    open_db(resolve_db_path()).map_err(|err| format!("task DB open failed: {err}"))
}

fn failure(call: &'static str, items: Vec<TaskItem>, message: String) -> TaskListResponse {
    warn!("event=ffi_call module=ffi status=error call={call}");
    TaskListResponse {
        ok: false,
        items,
        changed_index: None,
        change: change_label(None).to_string(),
        message,
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        task_id: task.id.to_string(),
        title: task.title.clone(),
    }
}

fn to_prompt_response(prompt: &TaskPrompt) -> TaskPromptResponse {
    TaskPromptResponse {
        ok: true,
        screen_title: SCREEN_TITLE.to_string(),
        heading: prompt.heading.to_string(),
        message: prompt.message.to_string(),
        placeholder: prompt.placeholder.to_string(),
        initial_text: prompt.initial_text.clone(),
        save_label: SAVE_ACTION_LABEL.to_string(),
        cancel_label: CANCEL_ACTION_LABEL.to_string(),
    }
}

fn change_label(change: Option<ListChange>) -> &'static str {
    match change {
        Some(ListChange::Reloaded) => "reloaded",
        Some(ListChange::Inserted(_)) => "inserted",
        Some(ListChange::Changed(_)) => "changed",
        Some(ListChange::Removed(_)) => "removed",
        None => "none",
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, ping, task_add, task_list_load, task_prompt_edit,
        task_prompt_new, task_remove, task_rename, TaskListResponse, DB_PATH,
    };
    use std::sync::{Mutex, MutexGuard};

    static DB_LOCK: Mutex<()> = Mutex::new(());

    /// Points every test at one fresh database and serializes access to it.
    fn test_db() -> MutexGuard<'static, ()> {
        DB_PATH.get_or_init(|| {
            tempfile::tempdir()
                .expect("temp dir")
                .keep()
                .join("tasklist-ffi-test.sqlite3")
        });
        DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn index_of(response: &TaskListResponse, task_id: &str) -> Option<u32> {
        response
            .items
            .iter()
            .position(|item| item.task_id == task_id)
            .map(|index| index as u32)
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), "  ".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/tasklist-logs".to_string());
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn add_rename_remove_round_trip_through_committed_list() {
        let _guard = test_db();

        let added = task_add("Buy milk".to_string());
        assert!(added.ok, "{}", added.message);
        assert_eq!(added.change, "inserted");
        let index = added.changed_index.expect("insert reports a row");
        assert_eq!(index as usize, added.items.len() - 1);
        let task_id = added.items[index as usize].task_id.clone();

        let renamed = task_rename(index, "Buy oat milk".to_string());
        assert!(renamed.ok, "{}", renamed.message);
        assert_eq!(renamed.changed_index, Some(index));
        assert_eq!(renamed.items[index as usize].title, "Buy oat milk");

        let loaded = task_list_load();
        assert!(loaded.ok);
        assert_eq!(loaded.change, "reloaded");
        assert_eq!(index_of(&loaded, &task_id), Some(index));

        let removed = task_remove(index);
        assert!(removed.ok, "{}", removed.message);
        assert_eq!(removed.change, "removed");
        assert_eq!(index_of(&removed, &task_id), None);
        assert_eq!(removed.items.len(), loaded.items.len() - 1);
    }

    #[test]
    fn remove_out_of_range_fails_with_notice_and_unchanged_items() {
        let _guard = test_db();
        let before = task_list_load();

        let response = task_remove(u32::MAX);
        assert!(!response.ok);
        assert_eq!(response.change, "none");
        assert!(response.message.starts_with("Could not delete the task"));
        assert_eq!(response.items, before.items);
    }

    #[test]
    fn edit_prompt_prefills_current_title() {
        let _guard = test_db();
        let added = task_add("Walk dog".to_string());
        let index = added.changed_index.expect("insert reports a row");

        let prompt = task_prompt_edit(index);
        assert!(prompt.ok, "{}", prompt.message);
        assert_eq!(prompt.heading, "Update Task");
        assert_eq!(prompt.initial_text.as_deref(), Some("Walk dog"));

        let missing = task_prompt_edit(u32::MAX);
        assert!(!missing.ok);

        let new_prompt = task_prompt_new();
        assert_eq!(new_prompt.heading, "New Task");
        assert_eq!(new_prompt.screen_title, "Task List");
        assert_eq!(new_prompt.save_label, "Save Task");
    }
}
