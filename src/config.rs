//! Client configuration parsed from environment variables.

use crate::net::types::Board;
use crate::state::board::MoveFailurePolicy;

pub const DEFAULT_API_BASE_URL: &str = "https://nickly24-tekmanbot-fa61.twc1.net";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Board selected at mount.
    pub board: Board,
    pub on_move_failure: MoveFailurePolicy,
    pub timeouts: ClientTimeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            board: Board::default(),
            on_move_failure: MoveFailurePolicy::default(),
            timeouts: ClientTimeouts::default(),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `TASKBOARD_API_URL`: service base URL
    /// - `TASKBOARD_BOARD`: `web` (default) or `tsd`
    /// - `TASKBOARD_ON_MOVE_FAILURE`: `keep` (default) or `rollback`
    /// - `TASKBOARD_REQUEST_TIMEOUT_SECS`: default 30
    /// - `TASKBOARD_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the board or move-failure policy is not recognized.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the board or move-failure policy is not recognized.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("TASKBOARD_API_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();

        let board = match lookup("TASKBOARD_BOARD") {
            Some(raw) => raw
                .parse::<Board>()
                .map_err(|e| ConfigError::Invalid { var: "TASKBOARD_BOARD", message: e.to_string() })?,
            None => Board::default(),
        };

        let on_move_failure = match lookup("TASKBOARD_ON_MOVE_FAILURE") {
            Some(raw) => raw
                .parse::<MoveFailurePolicy>()
                .map_err(|e| ConfigError::Invalid { var: "TASKBOARD_ON_MOVE_FAILURE", message: e.to_string() })?,
            None => MoveFailurePolicy::default(),
        };

        let timeouts = ClientTimeouts {
            request_secs: parse_u64_or(lookup("TASKBOARD_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64_or(lookup("TASKBOARD_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_base_url, board, on_move_failure, timeouts })
    }
}

fn parse_u64_or(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
