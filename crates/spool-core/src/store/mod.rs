//! Store module: the durable, ordered table of encoded commands.

#[cfg(test)]
mod conformance;
mod memory;
mod record;
mod sqlite;

pub use memory::InMemoryStore;
pub use record::StoredCommand;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{CommandEnvelope, CommandId, CommandStatus};
use crate::error::{StoreError, SubmitError};
use crate::typed::{Command, PayloadCodec};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub complete: usize,
}

/// Store port (interface).
///
/// Design intent:
/// - Store owns ids and status; payloads are opaque codec output.
/// - Every operation is internally synchronized, so producers may insert
///   while the worker is executing a command.
/// - No lock is held between calls; a handler running between `fetch_*` and
///   `complete` never blocks an `insert`.
#[async_trait]
pub trait CommandStore: Send + Sync {
    /// Persist a new Pending row and return its id.
    async fn insert(&self, payload: String) -> Result<CommandId, StoreError>;

    /// The Pending row with the smallest id whose id is greater than `cursor`.
    async fn fetch_pending_after(
        &self,
        cursor: CommandId,
    ) -> Result<Option<StoredCommand>, StoreError>;

    /// Pending -> Complete.
    ///
    /// `AlreadyComplete` / `NotFound` leave the table untouched.
    async fn complete(&self, id: CommandId) -> Result<(), StoreError>;

    /// Insert `follow_ups` (in order) and complete `id` as one unit.
    ///
    /// On `AlreadyComplete` / `NotFound` nothing is inserted. The default
    /// runs the plain calls one after another and is not atomic: a failure
    /// after some inserts leaves those rows behind. Stores that can do
    /// better override it.
    async fn complete_with_follow_ups(
        &self,
        id: CommandId,
        follow_ups: Vec<String>,
    ) -> Result<Vec<CommandId>, StoreError> {
        match self.status(id).await? {
            None => return Err(StoreError::NotFound(id)),
            Some(status) if status.is_terminal() => return Err(StoreError::AlreadyComplete(id)),
            Some(_) => {}
        }
        let mut ids = Vec::with_capacity(follow_ups.len());
        for payload in follow_ups {
            ids.push(self.insert(payload).await?);
        }
        self.complete(id).await?;
        Ok(ids)
    }

    async fn get(&self, id: CommandId) -> Result<Option<StoredCommand>, StoreError>;

    async fn counts(&self) -> Result<QueueCounts, StoreError>;

    /// The Pending row with the smallest id.
    async fn fetch_oldest_pending(&self) -> Result<Option<StoredCommand>, StoreError> {
        self.fetch_pending_after(CommandId::UNSET).await
    }

    async fn status(&self, id: CommandId) -> Result<Option<CommandStatus>, StoreError> {
        Ok(self.get(id).await?.map(|row| row.status))
    }

    async fn pending_count(&self) -> Result<usize, StoreError> {
        Ok(self.counts().await?.pending)
    }

    /// True when nothing is Pending.
    async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.pending_count().await? == 0)
    }
}

/// Encode and insert one envelope.
pub async fn submit_envelope(
    store: &dyn CommandStore,
    envelope: &CommandEnvelope,
) -> Result<CommandId, SubmitError> {
    let payload = PayloadCodec::new().encode(envelope)?;
    Ok(store.insert(payload).await?)
}

/// Encode and insert one typed command.
pub async fn submit<C: Command>(
    store: &dyn CommandStore,
    command: &C,
) -> Result<CommandId, SubmitError> {
    submit_envelope(store, &CommandEnvelope::from_command(command)?).await
}
