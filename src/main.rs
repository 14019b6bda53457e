use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use taskboard::clipboard::Osc52Clipboard;
use taskboard::config::{ClientConfig, ConfigError};
use taskboard::controller::{BoardController, BoardHandle, ControllerError};
use taskboard::net::api::{ApiError, HttpTaskService};
use taskboard::net::types::{Board, DraftError, Status, Task, TaskDraft, TaskId};
use taskboard::render::{render_board, render_task_detail};
use taskboard::state::board::{BoardState, LoadPhase, MoveFailurePolicy, MutationState};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Controller(#[from] ControllerError),
    #[error("failed to load tasks")]
    LoadFailed,
    #[error("task #{0} not found on this board")]
    TaskNotFound(TaskId),
    #[error("invalid task: {0}")]
    InvalidDraft(DraftError),
    #[error("{action} did not take effect; see log output (RUST_LOG=warn)")]
    NotApplied { action: &'static str },
}

#[derive(Parser, Debug)]
#[command(name = "taskboard", about = "Kanban board client for the web and TSD task boards")]
struct Cli {
    /// Service base URL; overrides TASKBOARD_API_URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Board to open: web or tsd; overrides TASKBOARD_BOARD.
    #[arg(long)]
    board: Option<Board>,

    /// keep or rollback; overrides TASKBOARD_ON_MOVE_FAILURE.
    #[arg(long)]
    on_move_failure: Option<MoveFailurePolicy>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the board.
    Show,
    /// Create a task.
    Add {
        #[arg(long)]
        task: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "set")]
        status: Status,
    },
    /// Move a task to another column.
    Move { id: TaskId, status: Status },
    /// Delete a task.
    Delete { id: TaskId },
    /// Print one task in full.
    Inspect { id: TaskId },
    /// Copy a task's title or description to the terminal clipboard.
    Copy {
        id: TaskId,
        #[arg(long, value_enum, default_value_t = CopyField::Title)]
        field: CopyField,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CopyField {
    Title,
    Description,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url.trim_end_matches('/').to_owned();
    }
    if let Some(board) = cli.board {
        config.board = board;
    }
    if let Some(policy) = cli.on_move_failure {
        config.on_move_failure = policy;
    }

    let service = HttpTaskService::from_config(&config)?;
    tracing::debug!(base_url = service.base_url(), board = %config.board, "mounting board");
    let (board, _controller) = BoardController::mount(
        Arc::new(service),
        Arc::new(Osc52Clipboard::stderr()),
        config.board,
        config.on_move_failure,
    );

    let loaded = board.settled().await?;
    if loaded.phase == LoadPhase::LoadError {
        print!("{}", render_board(&loaded));
        return Err(CliError::LoadFailed);
    }

    match cli.command.unwrap_or(Command::Show) {
        Command::Show => {
            print!("{}", render_board(&loaded));
            Ok(())
        }
        Command::Add { task, description, status } => run_add(&board, TaskDraft { task, description, status }).await,
        Command::Move { id, status } => run_move(&board, &loaded, id, status).await,
        Command::Delete { id } => run_delete(&board, &loaded, id).await,
        Command::Inspect { id } => run_inspect(&board, &loaded, id).await,
        Command::Copy { id, field } => run_copy(&board, &loaded, id, field).await,
    }
}

fn find(state: &BoardState, id: TaskId) -> Result<&Task, CliError> {
    state.task(id).ok_or(CliError::TaskNotFound(id))
}

async fn run_add(board: &BoardHandle, draft: TaskDraft) -> Result<(), CliError> {
    board.create_task(draft).await?;
    let state = board.settled().await?;
    if let Some(e) = state.form_error {
        return Err(CliError::InvalidDraft(e));
    }
    if state.form_open {
        return Err(CliError::NotApplied { action: "create" });
    }
    print!("{}", render_board(&state));
    Ok(())
}

async fn run_move(board: &BoardHandle, loaded: &BoardState, id: TaskId, status: Status) -> Result<(), CliError> {
    find(loaded, id)?;
    board.move_task(id, status).await?;
    let state = board.settled().await?;
    print!("{}", render_board(&state));
    if state.move_state(id) == Some(MutationState::Failed) {
        return Err(CliError::NotApplied { action: "move" });
    }
    Ok(())
}

async fn run_delete(board: &BoardHandle, loaded: &BoardState, id: TaskId) -> Result<(), CliError> {
    find(loaded, id)?;
    board.delete_task(id).await?;
    let state = board.settled().await?;
    print!("{}", render_board(&state));
    if state.task(id).is_some() {
        return Err(CliError::NotApplied { action: "delete" });
    }
    Ok(())
}

async fn run_inspect(board: &BoardHandle, loaded: &BoardState, id: TaskId) -> Result<(), CliError> {
    find(loaded, id)?;
    board.select_task(id).await?;
    let state = board.snapshot();
    let selected = state.selected.as_ref().ok_or(CliError::TaskNotFound(id))?;
    print!("{}", render_task_detail(selected));
    Ok(())
}

async fn run_copy(board: &BoardHandle, loaded: &BoardState, id: TaskId, field: CopyField) -> Result<(), CliError> {
    let task = find(loaded, id)?;
    let (label, text) = match field {
        CopyField::Title => ("title", task.task.clone()),
        CopyField::Description => ("description", task.description.clone()),
    };
    board.copy_to_clipboard(text).await?;
    println!("copied {label} of task #{id} to clipboard");
    Ok(())
}
