//! Stored command row: id + status + encoded payload.

use chrono::{DateTime, Utc};

use crate::domain::{CommandId, CommandStatus};

/// One row of the `commands` table.
///
/// Design:
/// - This is the single source of truth for id and status.
/// - `payload` is opaque codec output; the store never looks inside.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCommand {
    pub id: CommandId,
    pub status: CommandStatus,
    pub payload: String,

    /// Timestamps for observability.
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StoredCommand {
    pub fn pending(id: CommandId, payload: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: CommandStatus::Pending,
            payload,
            created_at,
            completed_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == CommandStatus::Pending
    }

    /// Pending -> Complete. Returns false if it was already complete.
    pub fn mark_complete(&mut self, at: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = CommandStatus::Complete;
        self.completed_at = Some(at);
        true
    }
}
