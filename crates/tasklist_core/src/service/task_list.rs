//! Task list controller.
//!
//! # Responsibility
//! - Keep an ordered in-memory copy of the store for display.
//! - Turn add/rename/remove intents into store calls plus row updates.
//!
//! # Invariants
//! - The in-memory list equals `fetch_all()` after every call returns.
//! - The list and the view change only after `flush` succeeds.
//! - A failed intent leaves the list untouched and raises a notice.

use crate::model::task::Task;
use crate::repo::task_store::{StoreError, StoreResult, TaskStore};
use crate::service::prompt::{PromptResponse, PromptTarget, TaskIntent, TaskPrompt};
use crate::service::view::{ListChange, TaskListView};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Failure of a user intent.
#[derive(Debug)]
pub enum ControllerError {
    /// Row index outside `0..len`.
    IndexOutOfRange { index: usize, len: usize },
    /// An edit prompt was answered after its row changed identity.
    StalePrompt { index: usize },
    Store(StoreError),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "row {index} is out of range for {len} task(s)")
            }
            Self::StalePrompt { index } => {
                write!(f, "row {index} changed while it was being edited")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ControllerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Clone, Copy)]
enum Intent {
    Load,
    Add,
    Rename,
    Remove,
}

impl Intent {
    fn label(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Add => "add",
            Self::Rename => "rename",
            Self::Remove => "remove",
        }
    }

    fn notice(self, err: &ControllerError) -> String {
        match self {
            Self::Load => format!("Could not load tasks: {err}"),
            Self::Add => format!("Could not save the new task: {err}"),
            Self::Rename => format!("Could not update the task: {err}"),
            Self::Remove => format!("Could not delete the task: {err}"),
        }
    }
}

/// In-memory task list mirroring a `TaskStore`.
pub struct TaskListController<S: TaskStore, V: TaskListView = ()> {
    store: S,
    view: V,
    tasks: Vec<Task>,
}

impl<S: TaskStore> TaskListController<S> {
    /// Creates a controller that renders nowhere.
    pub fn headless(store: S) -> Self {
        Self::new(store, ())
    }
}

impl<S: TaskStore, V: TaskListView> TaskListController<S, V> {
    /// Creates an empty controller; call [`Self::load`] before use.
    pub fn new(store: S, view: V) -> Self {
        Self {
            store,
            view,
            tasks: Vec::new(),
        }
    }

    /// Replaces the list with the store contents and re-renders everything.
    pub fn load(&mut self) -> ControllerResult<ListChange> {
        match self.store.fetch_all() {
            Ok(tasks) => {
                self.tasks = tasks;
                info!(
                    "event=list_load module=controller status=ok count={}",
                    self.tasks.len()
                );
                self.view.render(&self.tasks, ListChange::Reloaded);
                Ok(ListChange::Reloaded)
            }
            Err(err) => Err(self.fail(Intent::Load, err.into())),
        }
    }

    /// Creates a task and appends it at the tail.
    pub fn add_task(&mut self, title: &str) -> ControllerResult<ListChange> {
        let task = self.commit(Intent::Add, |store| store.create(title))?;
        self.tasks.push(task);
        self.applied(Intent::Add, ListChange::Inserted(self.tasks.len() - 1))
    }

    /// Renames the task at `index` without moving it.
    pub fn rename_task(&mut self, index: usize, new_title: &str) -> ControllerResult<ListChange> {
        let mut renamed = self.checked(Intent::Rename, index)?.clone();
        self.commit(Intent::Rename, |store| store.update(&mut renamed, new_title))?;
        self.tasks[index] = renamed;
        self.applied(Intent::Rename, ListChange::Changed(index))
    }

    /// Deletes the task at `index`.
    ///
    /// The store is flushed before the row leaves the list, so a failed
    /// delete keeps both sides in sync.
    pub fn remove_task(&mut self, index: usize) -> ControllerResult<ListChange> {
        let target = self.checked(Intent::Remove, index)?.clone();
        self.commit(Intent::Remove, |store| store.delete(&target))?;
        self.tasks.remove(index);
        self.applied(Intent::Remove, ListChange::Removed(index))
    }

    /// Dispatches an intent captured by the presentation layer.
    pub fn apply(&mut self, intent: TaskIntent) -> ControllerResult<ListChange> {
        match intent {
            TaskIntent::Add { title } => self.add_task(&title),
            TaskIntent::Rename { index, title } => self.rename_task(index, &title),
            TaskIntent::Remove { index } => self.remove_task(index),
        }
    }

    /// Dialog shown by the add button.
    pub fn prompt_new_task(&self) -> TaskPrompt {
        TaskPrompt::new_task()
    }

    /// Dialog shown when row `index` is tapped.
    pub fn prompt_edit_task(&self, index: usize) -> ControllerResult<TaskPrompt> {
        let task = self.tasks.get(index).ok_or(ControllerError::IndexOutOfRange {
            index,
            len: self.tasks.len(),
        })?;
        Ok(TaskPrompt::edit_task(index, task))
    }

    /// Applies the user's answer to `prompt`.
    ///
    /// Returns `Ok(None)` for cancel.
    pub fn resolve_prompt(
        &mut self,
        prompt: &TaskPrompt,
        response: PromptResponse,
    ) -> ControllerResult<Option<ListChange>> {
        let text = match response {
            PromptResponse::Save(text) => text,
            PromptResponse::Cancel => return Ok(None),
        };

        match prompt.target {
            PromptTarget::NewTask => self.add_task(&text).map(Some),
            PromptTarget::Existing { index, id } => {
                let current = self.checked(Intent::Rename, index)?;
                if current.id != id {
                    return Err(self.fail(Intent::Rename, ControllerError::StalePrompt { index }));
                }
                self.rename_task(index, &text).map(Some)
            }
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    fn checked(&mut self, intent: Intent, index: usize) -> ControllerResult<&Task> {
        let len = self.tasks.len();
        if index >= len {
            return Err(self.fail(intent, ControllerError::IndexOutOfRange { index, len }));
        }
        Ok(&self.tasks[index])
    }

    /// Runs a staged store mutation and flushes it; rolls back on any failure.
    fn commit<T>(
        &mut self,
        intent: Intent,
        mutation: impl FnOnce(&S) -> StoreResult<T>,
    ) -> ControllerResult<T> {
        let outcome = mutation(&self.store).and_then(|value| {
            self.store.flush()?;
            Ok(value)
        });

        match outcome {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Err(discard_err) = self.store.discard() {
                    error!(
                        "event=store_discard module=controller status=error intent={} error={discard_err}",
                        intent.label()
                    );
                }
                Err(self.fail(intent, err.into()))
            }
        }
    }

    fn applied(&mut self, intent: Intent, change: ListChange) -> ControllerResult<ListChange> {
        info!(
            "event=list_mutation module=controller status=ok intent={} count={}",
            intent.label(),
            self.tasks.len()
        );
        self.view.render(&self.tasks, change);
        Ok(change)
    }

    fn fail(&mut self, intent: Intent, err: ControllerError) -> ControllerError {
        warn!(
            "event=list_mutation module=controller status=error intent={} error={err}",
            intent.label()
        );
        self.view.show_notice(&intent.notice(&err));
        err
    }
}
