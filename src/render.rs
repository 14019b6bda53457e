//! Plain-text rendering of board snapshots.
//!
//! Used by the terminal front end. Output is line-oriented and contains no
//! escape sequences so it can be piped or diffed.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::fmt::Write as _;

use crate::net::types::{Status, Task};
use crate::state::board::{BoardState, MutationState};

/// Number of description characters shown on a card.
pub const PREVIEW_CHARS: usize = 50;

pub const LOADING_MESSAGE: &str = "Loading tasks...";

/// Card preview: the first [`PREVIEW_CHARS`] characters followed by `...`.
#[must_use]
pub fn preview(description: &str) -> String {
    let mut out: String = description.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

/// Render the whole board: header, banner, then one section per column.
#[must_use]
pub fn render_board(state: &BoardState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", state.active_board.label());

    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {error}");
    }
    if state.loading() {
        let _ = writeln!(out, "{LOADING_MESSAGE}");
        return out;
    }

    let columns = state.columns();
    for status in Status::COLUMNS {
        write_column(&mut out, state, status.label(), columns.get(status));
    }
    if !columns.unknown.is_empty() {
        write_column(&mut out, state, Status::Unknown.label(), &columns.unknown);
    }
    out
}

fn write_column(out: &mut String, state: &BoardState, title: &str, tasks: &[&Task]) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{title} ({})", tasks.len());
    for task in tasks {
        let marker = match state.move_state(task.id) {
            Some(MutationState::Pending) => " [saving]",
            Some(MutationState::Failed) => " [not saved]",
            Some(MutationState::Confirmed) | None => "",
        };
        let _ = writeln!(out, "  #{} {}{marker}", task.id, task.task);
        let _ = writeln!(out, "      {}", preview(&task.description));
    }
}

/// Detail view for a single task.
#[must_use]
pub fn render_task_detail(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", task.id, task.task);
    let _ = writeln!(out, "Status: {}", task.status.label());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", task.description);
    out
}
