//! Wire-protocol DTOs for the remote task service.
//!
//! DESIGN
//! ======
//! Responses are decoded leniently: a task whose `status` is missing or not
//! one of the three columns still decodes, as [`Status::Unknown`], so one bad
//! row never fails a whole board fetch. Outbound payloads are strict and
//! never carry `Unknown`.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Server-assigned task identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_i64_from_number(deserializer).map(Self)
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// Lifecycle stage of a task; one column per known variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Set,
    Process,
    Done,
    /// Missing or unrecognized status in a remote response.
    Unknown,
}

impl Status {
    /// The three board columns, in display order.
    pub const COLUMNS: [Status; 3] = [Status::Set, Status::Process, Status::Done];

    /// Wire value for this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Process => "process",
            Self::Done => "done",
            Self::Unknown => "unknown",
        }
    }

    /// Column heading shown to the user.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Set => "Task Set",
            Self::Process => "In Progress",
            Self::Done => "Done",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether this status names one of the three columns.
    #[must_use]
    pub fn is_column(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    fn from_wire(raw: &str) -> Self {
        match raw {
            "set" => Self::Set,
            "process" => Self::Process,
            "done" => Self::Done,
            _ => Self::Unknown,
        }
    }

    fn unknown() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown status '{0}' (expected set, process or done)")]
pub struct ParseStatusError(String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_wire(s.trim()) {
            Self::Unknown => Err(ParseStatusError(s.to_owned())),
            status => Ok(status),
        }
    }
}

impl Serialize for Status {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value.as_str().map_or(Self::Unknown, Self::from_wire))
    }
}

// =============================================================================
// BOARD
// =============================================================================

/// One of the two independently tracked task collections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Board {
    #[default]
    Web,
    Tsd,
}

impl Board {
    pub const ALL: [Board; 2] = [Board::Web, Board::Tsd];

    /// REST path prefix addressing this board's endpoints.
    #[must_use]
    pub fn path_prefix(self) -> &'static str {
        match self {
            Self::Web => "/api/web_canban",
            Self::Tsd => "/api/tsd_android_canban",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Tsd => "tsd",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Web => "Web Interface",
            Self::Tsd => "TSD Android",
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown board '{0}' (expected web or tsd)")]
pub struct ParseBoardError(String);

impl FromStr for Board {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "web" => Ok(Self::Web),
            "tsd" => Ok(Self::Tsd),
            other => Err(ParseBoardError(other.to_owned())),
        }
    }
}

// =============================================================================
// TASK
// =============================================================================

/// A task card as returned by the remote service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Short title.
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "Status::unknown")]
    pub status: Status,
}

/// Unsaved task-creation form state; also the `POST` body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub task: String,
    pub description: String,
    pub status: Status,
}

/// Required-field failures for a draft.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("task name is required")]
    MissingTask,
    #[error("description is required")]
    MissingDescription,
    #[error("status must be set, process or done")]
    InvalidStatus,
}

impl TaskDraft {
    /// Check the fields the creation form marks as required.
    ///
    /// # Errors
    ///
    /// Returns the first failing field, checked in form order.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.task.trim().is_empty() {
            return Err(DraftError::MissingTask);
        }
        if self.description.trim().is_empty() {
            return Err(DraftError::MissingDescription);
        }
        if !self.status.is_column() {
            return Err(DraftError::InvalidStatus);
        }
        Ok(())
    }
}

/// `PUT {prefix}/update` body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub id: TaskId,
    pub status: Status,
}

/// `DELETE {prefix}/delete` body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub id: TaskId,
}

fn deserialize_i64_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int);
            }
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            if let Some(float) = number.as_f64()
                && float.is_finite()
                && float.fract() == 0.0
                && float >= i64::MIN as f64
                && float < i64::MAX as f64
            {
                return Ok(float as i64);
            }
            Err(D::Error::custom("expected integer-compatible number"))
        }
        serde_json::Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("expected integer id, got '{text}'"))),
        _ => Err(D::Error::custom("expected number")),
    }
}
