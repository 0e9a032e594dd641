//! Plain-text rendering of the task list.

use tasklist_core::{ListChange, Task, TaskListView, SCREEN_TITLE};

pub struct TerminalView {
    quiet: bool,
}

impl TerminalView {
    /// A quiet view prints notices only, keeping stdout free for JSON.
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl TaskListView for TerminalView {
    fn render(&mut self, tasks: &[Task], change: ListChange) {
        if self.quiet {
            return;
        }
        println!("{SCREEN_TITLE}");
        if tasks.is_empty() {
            println!("  (no tasks)");
        }
        for (index, task) in tasks.iter().enumerate() {
            let marker = match change {
                ListChange::Inserted(row) | ListChange::Changed(row) if row == index => '*',
                _ => ' ',
            };
            println!("{marker}{:>3}. {}", index + 1, task.title);
        }
        if let ListChange::Removed(row) = change {
            println!("  (row {} removed)", row + 1);
        }
    }

    fn show_notice(&mut self, notice: &str) {
        eprintln!("! {notice}");
    }
}
