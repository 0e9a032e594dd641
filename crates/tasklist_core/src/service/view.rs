//! Display seam between the controller and whatever renders the list.

use crate::model::task::Task;

/// Row-level change applied to the displayed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    /// The whole list was replaced.
    Reloaded,
    /// A row was appended at this index.
    Inserted(usize),
    /// The row at this index has a new title.
    Changed(usize),
    /// The row at this index is gone; later rows shifted up by one.
    Removed(usize),
}

impl ListChange {
    /// Returns the affected row, or `None` for a full reload.
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Reloaded => None,
            Self::Inserted(index) | Self::Changed(index) | Self::Removed(index) => Some(index),
        }
    }
}

/// Presentation layer driven by `TaskListController`.
///
/// `render` is called only after the store has committed, so `tasks` is
/// always durable state.
pub trait TaskListView {
    fn render(&mut self, _tasks: &[Task], _change: ListChange) {}

    /// Shows a user-visible message for a failed intent.
    fn show_notice(&mut self, _notice: &str) {}
}

/// Headless view.
impl TaskListView for () {}

impl<V: TaskListView + ?Sized> TaskListView for &mut V {
    fn render(&mut self, tasks: &[Task], change: ListChange) {
        (**self).render(tasks, change);
    }

    fn show_notice(&mut self, notice: &str) {
        (**self).show_notice(notice);
    }
}
