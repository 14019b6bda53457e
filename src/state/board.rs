//! Board state for the active task board.
//!
//! SYSTEM CONTEXT
//! ==============
//! This model stores the local projection of one board: the task list as
//! last fetched and then patched by local mutations, the creation draft,
//! the selected task, and every outbound call still in flight.
//!
//! DESIGN
//! ======
//! Each outbound call gets a `RequestTag` naming the board it was issued
//! for. Completions whose tag no longer matches what the state expects are
//! stale and are discarded without touching the task list. Optimistic moves
//! keep a per-task tracker so the last confirmed status survives until the
//! latest request settles.

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::net::types::{Board, DraftError, Status, Task, TaskDraft, TaskId};

/// Banner text shown when the most recent fetch failed.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch tasks. Please try again later.";

// =============================================================================
// REQUEST TAGS
// =============================================================================

/// Monotonic per-state identifier for an outbound call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Context attached to an outbound call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestTag {
    pub id: RequestId,
    pub board: Board,
}

// =============================================================================
// PHASES & POLICIES
// =============================================================================

/// Load lifecycle of the active board's task list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadPhase {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A fetch for the active board is outstanding.
    Loading,
    /// The last fetch succeeded.
    Loaded,
    /// The last fetch failed; `error` carries the banner text.
    LoadError,
}

/// What a failed optimistic move does to the local task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MoveFailurePolicy {
    /// Leave the optimistic status in place; the failure is only logged.
    #[default]
    Keep,
    /// Restore the last status the service confirmed.
    Rollback,
}

impl MoveFailurePolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Rollback => "rollback",
        }
    }
}

impl fmt::Display for MoveFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown move failure policy '{0}' (expected keep or rollback)")]
pub struct ParsePolicyError(String);

impl FromStr for MoveFailurePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "keep" => Ok(Self::Keep),
            "rollback" => Ok(Self::Rollback),
            other => Err(ParsePolicyError(other.to_owned())),
        }
    }
}

/// Remote confirmation state of a task's latest move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationState {
    Pending,
    Confirmed,
    Failed,
}

/// Latest move issued for one task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveTracker {
    /// Request whose completion decides `state`; older completions are ignored.
    pub request: RequestId,
    pub target: Status,
    /// Status the service last acknowledged (or the fetched status).
    pub confirmed: Status,
    /// Request that set `confirmed`; `None` while it is still the fetched status.
    pub confirmed_by: Option<RequestId>,
    pub state: MutationState,
}

// =============================================================================
// BOARD STATE
// =============================================================================

/// Everything the presentation surface renders for one board.
#[derive(Clone, Debug, Default)]
pub struct BoardState {
    /// Board whose endpoints are currently addressed.
    pub active_board: Board,
    pub phase: LoadPhase,
    /// Tasks in arrival order; not sorted by status.
    pub tasks: Vec<Task>,
    /// Banner message from the most recent failed fetch.
    pub error: Option<String>,
    /// Creation form contents.
    pub draft: TaskDraft,
    /// Whether the creation form is shown.
    pub form_open: bool,
    /// Last required-field failure from a submit attempt.
    pub form_error: Option<DraftError>,
    /// Snapshot of the task shown in the detail view.
    pub selected: Option<Task>,
    pub on_move_failure: MoveFailurePolicy,
    /// Latest move per task since the last successful fetch.
    pub moves: HashMap<TaskId, MoveTracker>,
    /// Fetch whose response will be applied; any other fetch response is stale.
    pub pending_fetch: Option<RequestTag>,
    pub pending_create: Option<RequestId>,
    pub pending_deletes: HashSet<TaskId>,
    /// Status update and delete calls not yet answered, on any board.
    pub outstanding: HashSet<RequestId>,
    next_request: u64,
}

impl BoardState {
    #[must_use]
    pub fn new(board: Board, on_move_failure: MoveFailurePolicy) -> Self {
        Self { active_board: board, on_move_failure, ..Self::default() }
    }

    /// True only while a fetch for the active board is outstanding.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks in one column, in list order.
    #[must_use]
    pub fn tasks_by_status(&self, status: Status) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    #[must_use]
    pub fn columns(&self) -> Columns<'_> {
        Columns::partition(&self.tasks)
    }

    #[must_use]
    pub fn move_state(&self, id: TaskId) -> Option<MutationState> {
        self.moves.get(&id).map(|m| m.state)
    }

    /// Number of outbound calls whose completion is still expected.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        usize::from(self.pending_fetch.is_some()) + usize::from(self.pending_create.is_some()) + self.outstanding.len()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.in_flight() == 0
    }

    pub(crate) fn next_tag(&mut self) -> RequestTag {
        self.next_request += 1;
        RequestTag { id: RequestId(self.next_request), board: self.active_board }
    }
}

// =============================================================================
// COLUMNS
// =============================================================================

/// Tasks split by status. Every task lands in exactly one bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Columns<'a> {
    pub set: Vec<&'a Task>,
    pub process: Vec<&'a Task>,
    pub done: Vec<&'a Task>,
    /// Tasks whose remote status was missing or unrecognized.
    pub unknown: Vec<&'a Task>,
}

impl<'a> Columns<'a> {
    #[must_use]
    pub fn partition(tasks: &'a [Task]) -> Self {
        let mut columns = Self::default();
        for task in tasks {
            match task.status {
                Status::Set => columns.set.push(task),
                Status::Process => columns.process.push(task),
                Status::Done => columns.done.push(task),
                Status::Unknown => columns.unknown.push(task),
            }
        }
        columns
    }

    #[must_use]
    pub fn get(&self, status: Status) -> &[&'a Task] {
        match status {
            Status::Set => &self.set,
            Status::Process => &self.process,
            Status::Done => &self.done,
            Status::Unknown => &self.unknown,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len() + self.process.len() + self.done.len() + self.unknown.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
