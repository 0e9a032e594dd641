//! Interactive loop that drives the add/edit dialogs.

use crate::row_to_index;
use std::io::{self, BufRead, Write};
use tasklist_core::{
    PromptResponse, TaskListController, TaskListView, TaskPrompt, TaskStore, CANCEL_ACTION_LABEL,
    SAVE_ACTION_LABEL,
};

const HELP: &str = "commands: ls | add | edit <row> | rm <row> | help | quit";

/// Runs until `quit` or end of input.
///
/// Failed intents are reported by the view and do not end the session.
pub fn run<S: TaskStore, V: TaskListView>(
    controller: &mut TaskListController<S, V>,
) -> Result<(), String> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    session(controller, &mut lines)
}

fn session<S: TaskStore, V: TaskListView>(
    controller: &mut TaskListController<S, V>,
    mut lines: impl Iterator<Item = io::Result<String>>,
) -> Result<(), String> {
    println!("{HELP}");

    loop {
        let Some(line) = read_line(&mut lines, "> ")? else {
            return Ok(());
        };
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let row = words.next().and_then(|raw| raw.parse::<u32>().ok());

        match (command, row) {
            ("", _) => {}
            ("quit" | "exit", _) => return Ok(()),
            ("help", _) => println!("{HELP}"),
            // Controller errors are already printed by `TerminalView::show_notice`.
            ("ls", _) => {
                if controller.load().is_err() {
                    continue;
                }
            }
            ("add", _) => {
                let prompt = controller.prompt_new_task();
                let response = ask(&mut lines, &prompt)?;
                if controller.resolve_prompt(&prompt, response).is_err() {
                    continue;
                }
            }
            ("edit", Some(row)) => {
                if let Ok(prompt) = controller.prompt_edit_task(row_to_index(row)) {
                    let response = ask(&mut lines, &prompt)?;
                    if controller.resolve_prompt(&prompt, response).is_err() {
                        continue;
                    }
                } else {
                    eprintln!("! no task at row {row}");
                }
            }
            ("rm", Some(row)) => {
                if controller.remove_task(row_to_index(row)).is_err() {
                    continue;
                }
            }
            _ => eprintln!("! {HELP}"),
        }
    }
}

/// Shows `prompt` and reads the answer; an empty line or end of input cancels.
fn ask(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    prompt: &TaskPrompt,
) -> Result<PromptResponse, String> {
    println!("{}: {}", prompt.heading, prompt.message);
    if let Some(current) = &prompt.initial_text {
        println!("  current: {current}");
    }
    println!("  (enter text to {SAVE_ACTION_LABEL}, empty line to {CANCEL_ACTION_LABEL})");

    match read_line(lines, &format!("[{}] ", prompt.placeholder))? {
        Some(text) if !text.is_empty() => Ok(PromptResponse::Save(text)),
        _ => Ok(PromptResponse::Cancel),
    }
}

fn read_line(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    marker: &str,
) -> Result<Option<String>, String> {
    print!("{marker}");
    io::stdout()
        .flush()
        .map_err(|err| format!("cannot write to terminal: {err}"))?;
    match lines.next() {
        Some(Ok(line)) => Ok(Some(line.trim_end().to_string())),
        Some(Err(err)) => Err(format!("cannot read from terminal: {err}")),
        None => Ok(None),
    }
}
