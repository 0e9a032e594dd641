//! Text-entry dialog model for adding and renaming tasks.
//!
//! The presentation layer shows a `TaskPrompt`, collects a
//! `PromptResponse`, and hands both back to
//! `TaskListController::resolve_prompt`.

use crate::model::task::{Task, TaskId};

/// Title of the task list screen.
pub const SCREEN_TITLE: &str = "Task List";
pub const SAVE_ACTION_LABEL: &str = "Save Task";
pub const CANCEL_ACTION_LABEL: &str = "Cancel";

const NEW_TASK_HEADING: &str = "New Task";
const UPDATE_TASK_HEADING: &str = "Update Task";
const PROMPT_MESSAGE: &str = "What do you want to do?";
const PROMPT_PLACEHOLDER: &str = "New Task";

/// Which record a prompt will write to when saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTarget {
    NewTask,
    /// Row `index` showed task `id` when the prompt was opened.
    Existing { index: usize, id: TaskId },
}

/// Dialog contents plus the target the answer applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPrompt {
    pub heading: &'static str,
    pub message: &'static str,
    pub placeholder: &'static str,
    /// Prefilled field text; the current title when editing.
    pub initial_text: Option<String>,
    pub target: PromptTarget,
}

impl TaskPrompt {
    pub fn new_task() -> Self {
        Self {
            heading: NEW_TASK_HEADING,
            message: PROMPT_MESSAGE,
            placeholder: PROMPT_PLACEHOLDER,
            initial_text: None,
            target: PromptTarget::NewTask,
        }
    }

    pub fn edit_task(index: usize, task: &Task) -> Self {
        Self {
            heading: UPDATE_TASK_HEADING,
            message: PROMPT_MESSAGE,
            placeholder: PROMPT_PLACEHOLDER,
            initial_text: Some(task.title.clone()),
            target: PromptTarget::Existing { index, id: task.id },
        }
    }
}

/// What the user did with the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    /// Save with the field's text, which may be empty.
    Save(String),
    Cancel,
}

/// User intent routed to the controller without going through a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskIntent {
    Add { title: String },
    Rename { index: usize, title: String },
    Remove { index: usize },
}

#[cfg(test)]
mod tests {
    use super::{PromptTarget, TaskPrompt};
    use crate::model::task::{new_task_id, Task};

    #[test]
    fn edit_prompt_prefills_current_title_and_pins_identity() {
        let task = Task {
            id: new_task_id(),
            title: "Walk dog".to_string(),
            created_at: 0,
            updated_at: 0,
        };

        let prompt = TaskPrompt::edit_task(3, &task);
        assert_eq!(prompt.heading, "Update Task");
        assert_eq!(prompt.initial_text.as_deref(), Some("Walk dog"));
        assert_eq!(
            prompt.target,
            PromptTarget::Existing {
                index: 3,
                id: task.id
            }
        );
    }

    #[test]
    fn new_prompt_starts_empty() {
        let prompt = TaskPrompt::new_task();
        assert_eq!(prompt.heading, "New Task");
        assert_eq!(prompt.placeholder, "New Task");
        assert_eq!(prompt.initial_text, None);
        assert_eq!(prompt.target, PromptTarget::NewTask);
    }
}
