//! In-memory store implementation (tests and throwaway runs).

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{CommandStore, QueueCounts, StoredCommand};
use crate::domain::CommandId;
use crate::error::StoreError;

/// In-memory store state.
struct InMemoryStoreState {
    /// All rows (single source of truth).
    rows: BTreeMap<CommandId, StoredCommand>,

    /// Pending index (ids only), ordered.
    pending: BTreeSet<CommandId>,

    /// Next id to assign.
    next_id: i64,
}

impl InMemoryStoreState {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            pending: BTreeSet::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> CommandId {
        let id = CommandId::new(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Mutex-guarded map. Nothing survives the process.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<InMemoryStoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryStoreState::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandStore for InMemoryStore {
    async fn insert(&self, payload: String) -> Result<CommandId, StoreError> {
        let mut state = self.state.lock().await;
        let id = state.allocate_id();
        state
            .rows
            .insert(id, StoredCommand::pending(id, payload, Utc::now()));
        state.pending.insert(id);
        Ok(id)
    }

    async fn fetch_pending_after(
        &self,
        cursor: CommandId,
    ) -> Result<Option<StoredCommand>, StoreError> {
        let state = self.state.lock().await;
        let next = state
            .pending
            .range((Bound::Excluded(cursor), Bound::Unbounded))
            .next()
            .and_then(|id| state.rows.get(id))
            .cloned();
        Ok(next)
    }

    async fn complete(&self, id: CommandId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let Some(row) = state.rows.get_mut(&id) else {
            return Err(StoreError::NotFound(id));
        };
        if !row.mark_complete(Utc::now()) {
            return Err(StoreError::AlreadyComplete(id));
        }
        state.pending.remove(&id);
        Ok(())
    }

    async fn complete_with_follow_ups(
        &self,
        id: CommandId,
        follow_ups: Vec<String>,
    ) -> Result<Vec<CommandId>, StoreError> {
        // one lock for the whole unit
        let mut state = self.state.lock().await;
        match state.rows.get(&id) {
            None => return Err(StoreError::NotFound(id)),
            Some(row) if !row.is_pending() => return Err(StoreError::AlreadyComplete(id)),
            Some(_) => {}
        }

        let now = Utc::now();
        let mut ids = Vec::with_capacity(follow_ups.len());
        for payload in follow_ups {
            let child = state.allocate_id();
            state
                .rows
                .insert(child, StoredCommand::pending(child, payload, now));
            state.pending.insert(child);
            ids.push(child);
        }
        if let Some(row) = state.rows.get_mut(&id) {
            row.mark_complete(now);
        }
        state.pending.remove(&id);
        Ok(ids)
    }

    async fn get(&self, id: CommandId) -> Result<Option<StoredCommand>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.rows.get(&id).cloned())
    }

    async fn counts(&self) -> Result<QueueCounts, StoreError> {
        let state = self.state.lock().await;
        let pending = state.pending.len();
        Ok(QueueCounts {
            pending,
            complete: state.rows.len() - pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;

    #[tokio::test]
    async fn fifo_fetch_order() {
        conformance::fifo_fetch_order(&InMemoryStore::new()).await;
    }

    #[tokio::test]
    async fn cursor_walk_returns_every_pending_row_in_order() {
        conformance::cursor_walk_returns_every_pending_row_in_order(&InMemoryStore::new()).await;
    }

    #[tokio::test]
    async fn complete_with_follow_ups_inserts_children_and_completes() {
        conformance::complete_with_follow_ups_inserts_children_and_completes(&InMemoryStore::new()).await;
    }

    #[tokio::test]
    async fn complete_with_follow_ups_on_finished_parent_inserts_nothing() {
        conformance::complete_with_follow_ups_on_finished_parent_inserts_nothing(&InMemoryStore::new()).await;
    }

    #[tokio::test]
    async fn completed_rows_are_never_fetched() {
        conformance::completed_rows_are_never_fetched(&InMemoryStore::new()).await;
    }

    #[tokio::test]
    async fn complete_twice_reports_already_complete() {
        conformance::complete_twice_reports_already_complete(&InMemoryStore::new()).await;
    }

    #[tokio::test]
    async fn complete_missing_reports_not_found() {
        conformance::complete_missing_reports_not_found(&InMemoryStore::new()).await;
    }

    #[tokio::test]
    async fn cursor_skips_rows_at_or_below_it() {
        conformance::cursor_skips_rows_at_or_below_it(&InMemoryStore::new()).await;
    }

    #[tokio::test]
    async fn concurrent_inserts_get_unique_ids() {
        conformance::concurrent_inserts_get_unique_ids(Arc::new(InMemoryStore::new())).await;
    }

    #[tokio::test]
    async fn clones_share_rows() {
        let store = InMemoryStore::new();
        let other = store.clone();
        let id = store.insert("e30=".into()).await.unwrap();
        assert!(other.get(id).await.unwrap().is_some());
    }
}
