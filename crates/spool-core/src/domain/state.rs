//! Command status stored next to each row.

use serde::{Deserialize, Serialize};

/// Status of a persisted command.
///
/// State transitions:
/// - Pending -> Complete
///
/// There is no in-progress state. A row that was fetched but never completed
/// (crash, failed action, undecodable payload) is still Pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Pending,
    Complete,
}

impl CommandStatus {
    /// Column value in the `commands` table.
    pub fn as_i64(self) -> i64 {
        match self {
            CommandStatus::Pending => 0,
            CommandStatus::Complete => 1,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(CommandStatus::Pending),
            1 => Some(CommandStatus::Complete),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CommandStatus::Complete)
    }
}
