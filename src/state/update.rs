//! Command and completion handlers for the board state.
//!
//! DESIGN
//! ======
//! User intents arrive as `Command`s and outcomes of remote calls arrive as
//! `Completion`s. Both handlers mutate only the `BoardState` they are given
//! and never perform I/O: a command returns the `Effect`s it needs executed,
//! and the controller feeds each effect's outcome back as a completion. This
//! keeps every transition testable without a runtime.
//!
//! ERROR HANDLING
//! ==============
//! A failed fetch becomes the `LoadError` phase with a fixed banner message.
//! Failed mutations are logged and never surfaced; what a failed move does
//! locally is decided by `BoardState::on_move_failure`. Deletes only remove
//! the task once the service confirms.

#[cfg(test)]
#[path = "update_test.rs"]
mod update_test;

use tracing::{debug, info, warn};

use super::board::{
    BoardState, FETCH_ERROR_MESSAGE, LoadPhase, MoveFailurePolicy, MoveTracker, MutationState, RequestTag,
};
use crate::net::api::ApiError;
use crate::net::types::{Board, Status, Task, TaskDraft, TaskId};

// =============================================================================
// MESSAGES
// =============================================================================

/// One edit to the creation form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DraftField {
    Task(String),
    Description(String),
    Status(Status),
}

/// A user intent forwarded by the presentation surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// First render: load the active board.
    Mount,
    /// Reload the active board, keeping the current list until it arrives.
    Refresh,
    SelectBoard(Board),
    /// Drop of a task card onto a column.
    MoveTask { id: TaskId, status: Status },
    DeleteTask(TaskId),
    OpenForm,
    /// Cancel the creation form; the draft is reset.
    CloseForm,
    EditDraft(DraftField),
    SubmitDraft,
    SelectTask(TaskId),
    ClearSelection,
    CopyToClipboard(String),
}

/// Outcome of an effect, tagged with the request it answers.
#[derive(Debug)]
pub enum Completion {
    Fetched { tag: RequestTag, result: Result<Vec<Task>, ApiError> },
    Created { tag: RequestTag, result: Result<Task, ApiError> },
    StatusUpdated { tag: RequestTag, id: TaskId, status: Status, result: Result<(), ApiError> },
    Deleted { tag: RequestTag, id: TaskId, result: Result<(), ApiError> },
}

/// Side effect requested by a command handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Fetch { tag: RequestTag },
    /// Abort a fetch whose response is no longer wanted.
    CancelFetch { tag: RequestTag },
    Create { tag: RequestTag, draft: TaskDraft },
    UpdateStatus { tag: RequestTag, id: TaskId, status: Status },
    Delete { tag: RequestTag, id: TaskId },
    WriteClipboard(String),
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Apply a user intent and return the effects it requires.
pub fn handle_command(state: &mut BoardState, command: Command) -> Vec<Effect> {
    match command {
        Command::Mount | Command::Refresh => begin_fetch(state),
        Command::SelectBoard(board) => select_board(state, board),
        Command::MoveTask { id, status } => move_task(state, id, status).into_iter().collect(),
        Command::DeleteTask(id) => delete_task(state, id).into_iter().collect(),
        Command::OpenForm => {
            state.form_open = true;
            state.form_error = None;
            Vec::new()
        }
        Command::CloseForm => {
            state.form_open = false;
            state.form_error = None;
            state.draft = TaskDraft::default();
            Vec::new()
        }
        Command::EditDraft(field) => {
            match field {
                DraftField::Task(value) => state.draft.task = value,
                DraftField::Description(value) => state.draft.description = value,
                DraftField::Status(value) => state.draft.status = value,
            }
            state.form_error = None;
            Vec::new()
        }
        Command::SubmitDraft => submit_draft(state).into_iter().collect(),
        Command::SelectTask(id) => {
            state.selected = state.task(id).cloned();
            if state.selected.is_none() {
                warn!(board = %state.active_board, task_id = %id, "select ignored: task not on board");
            }
            Vec::new()
        }
        Command::ClearSelection => {
            state.selected = None;
            Vec::new()
        }
        Command::CopyToClipboard(text) => vec![Effect::WriteClipboard(text)],
    }
}

fn begin_fetch(state: &mut BoardState) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    if let Some(stale) = state.pending_fetch.take() {
        effects.push(Effect::CancelFetch { tag: stale });
    }

    let tag = state.next_tag();
    state.phase = LoadPhase::Loading;
    state.pending_fetch = Some(tag);
    debug!(board = %tag.board, request_id = %tag.id, "fetching tasks");
    effects.push(Effect::Fetch { tag });
    effects
}

fn select_board(state: &mut BoardState, board: Board) -> Vec<Effect> {
    if board != state.active_board {
        info!(from = %state.active_board, to = %board, "switching board");
    }
    state.active_board = board;
    state.tasks.clear();
    state.selected = None;
    state.moves.clear();
    state.pending_deletes.clear();
    begin_fetch(state)
}

fn move_task(state: &mut BoardState, id: TaskId, status: Status) -> Option<Effect> {
    let board = state.active_board;
    if !status.is_column() {
        warn!(%board, task_id = %id, "move ignored: target is not a column");
        return None;
    }
    let Some(previous) = state.task(id).map(|t| t.status) else {
        warn!(%board, task_id = %id, "move ignored: task not on board");
        return None;
    };
    if previous == status {
        debug!(%board, task_id = %id, %status, "move ignored: task already in column");
        return None;
    }

    let (confirmed, confirmed_by) = state.moves.get(&id).map_or((previous, None), |m| (m.confirmed, m.confirmed_by));
    let tag = state.next_tag();
    if let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) {
        task.status = status;
    }
    state.outstanding.insert(tag.id);
    state.moves.insert(
        id,
        MoveTracker { request: tag.id, target: status, confirmed, confirmed_by, state: MutationState::Pending },
    );
    debug!(%board, task_id = %id, from = %previous, to = %status, request_id = %tag.id, "task moved");
    Some(Effect::UpdateStatus { tag, id, status })
}

fn delete_task(state: &mut BoardState, id: TaskId) -> Option<Effect> {
    let board = state.active_board;
    if state.task(id).is_none() {
        warn!(%board, task_id = %id, "delete ignored: task not on board");
        return None;
    }
    if !state.pending_deletes.insert(id) {
        debug!(%board, task_id = %id, "delete ignored: already pending");
        return None;
    }
    let tag = state.next_tag();
    state.outstanding.insert(tag.id);
    Some(Effect::Delete { tag, id })
}

fn submit_draft(state: &mut BoardState) -> Option<Effect> {
    if state.pending_create.is_some() {
        debug!("submit ignored: create already pending");
        return None;
    }
    if let Err(e) = state.draft.validate() {
        debug!(error = %e, "submit rejected");
        state.form_error = Some(e);
        return None;
    }
    let tag = state.next_tag();
    state.pending_create = Some(tag.id);
    state.form_error = None;
    Some(Effect::Create { tag, draft: state.draft.clone() })
}

// =============================================================================
// COMPLETIONS
// =============================================================================

/// Fold the outcome of a remote call into the state.
pub fn apply_completion(state: &mut BoardState, completion: Completion) {
    match completion {
        Completion::Fetched { tag, result } => apply_fetched(state, tag, result),
        Completion::Created { tag, result } => apply_created(state, tag, result),
        Completion::StatusUpdated { tag, id, status, result } => apply_status_updated(state, tag, id, status, result),
        Completion::Deleted { tag, id, result } => apply_deleted(state, tag, id, result),
    }
}

fn apply_fetched(state: &mut BoardState, tag: RequestTag, result: Result<Vec<Task>, ApiError>) {
    if state.pending_fetch != Some(tag) {
        debug!(board = %tag.board, request_id = %tag.id, "discarding stale fetch response");
        return;
    }
    state.pending_fetch = None;

    match result {
        Ok(tasks) => {
            info!(board = %tag.board, count = tasks.len(), "tasks loaded");
            state.tasks = tasks;
            state.error = None;
            state.phase = LoadPhase::Loaded;
            state.moves.clear();
        }
        Err(e) => {
            warn!(board = %tag.board, error = %e, network = e.is_network(), "error fetching tasks");
            state.error = Some(FETCH_ERROR_MESSAGE.to_owned());
            state.phase = LoadPhase::LoadError;
        }
    }
}

fn apply_created(state: &mut BoardState, tag: RequestTag, result: Result<Task, ApiError>) {
    if state.pending_create != Some(tag.id) {
        debug!(board = %tag.board, request_id = %tag.id, "discarding stale create response");
        return;
    }
    state.pending_create = None;

    let task = match result {
        Ok(task) => task,
        Err(e) => {
            warn!(board = %tag.board, error = %e, network = e.is_network(), "error adding task");
            return;
        }
    };

    state.draft = TaskDraft::default();
    state.form_open = false;
    state.form_error = None;

    if tag.board != state.active_board {
        info!(board = %tag.board, task_id = %task.id, "task created on inactive board; not listed");
        return;
    }
    info!(board = %tag.board, task_id = %task.id, "task created");
    match state.tasks.iter_mut().find(|t| t.id == task.id) {
        Some(existing) => *existing = task,
        None => state.tasks.push(task),
    }
}

fn apply_status_updated(
    state: &mut BoardState,
    tag: RequestTag,
    id: TaskId,
    status: Status,
    result: Result<(), ApiError>,
) {
    state.outstanding.remove(&tag.id);
    if tag.board != state.active_board {
        debug!(board = %tag.board, task_id = %id, "discarding status update for inactive board");
        return;
    }
    let Some(tracker) = state.moves.get_mut(&id) else {
        if let Err(e) = result {
            warn!(board = %tag.board, task_id = %id, error = %e, "status update for untracked task failed");
        }
        return;
    };

    if tracker.request != tag.id {
        match result {
            // Acknowledged after a newer move was issued; the service now holds `status`
            // unless a later acknowledgement already replaced it.
            Ok(()) if tracker.confirmed_by.is_none_or(|by| by < tag.id) => {
                debug!(
                    board = %tag.board,
                    task_id = %id,
                    %status,
                    request_id = %tag.id,
                    "superseded status update confirmed"
                );
                tracker.confirmed = status;
                tracker.confirmed_by = Some(tag.id);
                if tracker.state == MutationState::Failed && state.on_move_failure == MoveFailurePolicy::Rollback {
                    if let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) {
                        task.status = status;
                    }
                }
            }
            Ok(()) => {}
            Err(e) => {
                warn!(board = %tag.board, task_id = %id, error = %e, "superseded status update failed");
            }
        }
        return;
    }

    match result {
        Ok(()) => {
            tracker.state = MutationState::Confirmed;
            tracker.confirmed = status;
            tracker.confirmed_by = Some(tag.id);
        }
        Err(e) => {
            tracker.state = MutationState::Failed;
            warn!(
                board = %tag.board,
                task_id = %id,
                error = %e,
                network = e.is_network(),
                policy = %state.on_move_failure,
                "error updating task status"
            );
            if state.on_move_failure == MoveFailurePolicy::Rollback {
                let restore = tracker.confirmed;
                if let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) {
                    task.status = restore;
                }
            }
        }
    }
}

fn apply_deleted(state: &mut BoardState, tag: RequestTag, id: TaskId, result: Result<(), ApiError>) {
    state.outstanding.remove(&tag.id);
    if tag.board != state.active_board {
        debug!(board = %tag.board, task_id = %id, "discarding delete for inactive board");
        return;
    }
    state.pending_deletes.remove(&id);

    if let Err(e) = result {
        warn!(board = %tag.board, task_id = %id, error = %e, network = e.is_network(), "error deleting task");
        return;
    }
    info!(board = %tag.board, task_id = %id, "task deleted");
    state.tasks.retain(|t| t.id != id);
    state.moves.remove(&id);
    if state.selected.as_ref().is_some_and(|t| t.id == id) {
        state.selected = None;
    }
}
