//! Board controller runtime.
//!
//! SYSTEM CONTEXT
//! ==============
//! The presentation surface holds a `BoardHandle`: it sends commands and
//! reads `BoardState` snapshots. A single controller task owns the state,
//! runs the pure handlers from `state::update`, and executes the effects
//! they return.
//!
//! DESIGN
//! ======
//! Every remote call runs as its own task in a `JoinSet` and reports back
//! over a channel, so a slow call never blocks new commands and overlapping
//! calls are allowed. Fetches keep an abort handle so a board switch can
//! cancel the superseded one; the state's request tags still reject any
//! response that slips past the abort. Dropping every handle stops the
//! controller and aborts whatever is still in flight.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{AbortHandle, JoinHandle, JoinSet};
use tracing::{debug, error, warn};

use crate::clipboard::Clipboard;
use crate::net::api::TaskService;
use crate::net::types::{Board, Status, TaskDraft, TaskId};
use crate::state::board::{BoardState, MoveFailurePolicy, RequestId};
use crate::state::update::{Command, Completion, DraftField, Effect, apply_completion, handle_command};

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("board controller stopped")]
    Stopped,
}

struct Envelope {
    command: Command,
    ack: oneshot::Sender<()>,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Read-only view of the board plus a command channel into the controller.
#[derive(Clone)]
pub struct BoardHandle {
    commands: mpsc::UnboundedSender<Envelope>,
    snapshots: watch::Receiver<BoardState>,
}

impl BoardHandle {
    /// Send a command and wait until the controller has applied it.
    ///
    /// Effects the command started may still be in flight; see [`BoardHandle::settled`].
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn dispatch(&self, command: Command) -> Result<(), ControllerError> {
        let (ack, applied) = oneshot::channel();
        self.commands.send(Envelope { command, ack }).map_err(|_| ControllerError::Stopped)?;
        applied.await.map_err(|_| ControllerError::Stopped)
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> BoardState {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BoardState> {
        self.snapshots.clone()
    }

    /// Wait until no remote call is outstanding and return that state.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller stops first.
    pub async fn settled(&self) -> Result<BoardState, ControllerError> {
        let mut snapshots = self.snapshots.clone();
        let state = snapshots.wait_for(BoardState::is_settled).await.map_err(|_| ControllerError::Stopped)?;
        Ok(state.clone())
    }

    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn select_board(&self, board: Board) -> Result<(), ControllerError> {
        self.dispatch(Command::SelectBoard(board)).await
    }

    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn refresh(&self) -> Result<(), ControllerError> {
        self.dispatch(Command::Refresh).await
    }

    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn move_task(&self, id: TaskId, status: Status) -> Result<(), ControllerError> {
        self.dispatch(Command::MoveTask { id, status }).await
    }

    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn delete_task(&self, id: TaskId) -> Result<(), ControllerError> {
        self.dispatch(Command::DeleteTask(id)).await
    }

    /// Fill the creation form with `draft` and submit it.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn create_task(&self, draft: TaskDraft) -> Result<(), ControllerError> {
        self.dispatch(Command::OpenForm).await?;
        self.dispatch(Command::EditDraft(DraftField::Task(draft.task))).await?;
        self.dispatch(Command::EditDraft(DraftField::Description(draft.description))).await?;
        self.dispatch(Command::EditDraft(DraftField::Status(draft.status))).await?;
        self.dispatch(Command::SubmitDraft).await
    }

    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn select_task(&self, id: TaskId) -> Result<(), ControllerError> {
        self.dispatch(Command::SelectTask(id)).await
    }

    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn clear_selection(&self) -> Result<(), ControllerError> {
        self.dispatch(Command::ClearSelection).await
    }

    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn copy_to_clipboard(&self, text: impl Into<String>) -> Result<(), ControllerError> {
        self.dispatch(Command::CopyToClipboard(text.into())).await
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct BoardController {
    state: BoardState,
    service: Arc<dyn TaskService>,
    clipboard: Arc<dyn Clipboard>,
    commands: mpsc::UnboundedReceiver<Envelope>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    snapshots: watch::Sender<BoardState>,
    calls: JoinSet<()>,
    fetches: HashMap<RequestId, AbortHandle>,
}

impl BoardController {
    /// Spawn a controller for `board` and start loading it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(
        service: Arc<dyn TaskService>,
        clipboard: Arc<dyn Clipboard>,
        board: Board,
        on_move_failure: MoveFailurePolicy,
    ) -> (BoardHandle, JoinHandle<()>) {
        let state = BoardState::new(board, on_move_failure);
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) = watch::channel(state.clone());

        let mut controller = Self {
            state,
            service,
            clipboard,
            commands,
            completions_tx,
            completions,
            snapshots,
            calls: JoinSet::new(),
            fetches: HashMap::new(),
        };
        controller.handle(Command::Mount);
        controller.publish();

        let task = tokio::spawn(controller.run());
        (BoardHandle { commands: commands_tx, snapshots: snapshots_rx }, task)
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                envelope = self.commands.recv() => {
                    let Some(Envelope { command, ack }) = envelope else {
                        break;
                    };
                    self.handle(command);
                    self.publish();
                    let _ = ack.send(());
                }
                Some(completion) = self.completions.recv() => {
                    self.complete(completion);
                    self.publish();
                }
                Some(joined) = self.calls.join_next(), if !self.calls.is_empty() => {
                    if let Err(e) = joined
                        && e.is_panic()
                    {
                        error!(error = %e, "remote call panicked");
                    }
                }
            }
        }

        self.calls.abort_all();
        debug!(board = %self.state.active_board, "board controller stopped");
    }

    fn handle(&mut self, command: Command) {
        for effect in handle_command(&mut self.state, command) {
            self.execute(effect);
        }
    }

    fn complete(&mut self, completion: Completion) {
        if let Completion::Fetched { tag, .. } = &completion {
            self.fetches.remove(&tag.id);
        }
        apply_completion(&mut self.state, completion);
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.clone());
    }

    fn execute(&mut self, effect: Effect) {
        let service = Arc::clone(&self.service);
        match effect {
            Effect::Fetch { tag } => {
                let handle = self.spawn_call(async move {
                    let result = service.list(tag.board).await;
                    Completion::Fetched { tag, result }
                });
                self.fetches.insert(tag.id, handle);
            }
            Effect::CancelFetch { tag } => {
                if let Some(handle) = self.fetches.remove(&tag.id) {
                    handle.abort();
                    debug!(board = %tag.board, request_id = %tag.id, "fetch cancelled");
                }
            }
            Effect::Create { tag, draft } => {
                self.spawn_call(async move {
                    let result = service.create(tag.board, &draft).await;
                    Completion::Created { tag, result }
                });
            }
            Effect::UpdateStatus { tag, id, status } => {
                self.spawn_call(async move {
                    let result = service.update_status(tag.board, id, status).await;
                    Completion::StatusUpdated { tag, id, status, result }
                });
            }
            Effect::Delete { tag, id } => {
                self.spawn_call(async move {
                    let result = service.delete(tag.board, id).await;
                    Completion::Deleted { tag, id, result }
                });
            }
            Effect::WriteClipboard(text) => {
                if let Err(e) = self.clipboard.write_text(&text) {
                    warn!(error = %e, "copy to clipboard failed");
                }
            }
        }
    }

    fn spawn_call<F>(&mut self, call: F) -> AbortHandle
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let completions = self.completions_tx.clone();
        self.calls.spawn(async move {
            let _ = completions.send(call.await);
        })
    }
}
