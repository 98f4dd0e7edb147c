//! Behavior every `CommandStore` must show. Each store's test module calls
//! these against its own instance.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::CommandStore;
use crate::domain::{CommandId, CommandStatus};
use crate::error::StoreError;

pub async fn fifo_fetch_order(store: &dyn CommandStore) {
    let mut inserted = Vec::new();
    for i in 0..5 {
        inserted.push(store.insert(format!("payload-{i}")).await.unwrap());
    }
    assert!(inserted.windows(2).all(|w| w[0] < w[1]));

    let mut fetched = Vec::new();
    while let Some(row) = store.fetch_oldest_pending().await.unwrap() {
        assert_eq!(row.status, CommandStatus::Pending);
        fetched.push(row.id);
        store.complete(row.id).await.unwrap();
    }
    assert_eq!(fetched, inserted);
}

pub async fn cursor_walk_returns_every_pending_row_in_order(store: &dyn CommandStore) {
    let mut inserted = Vec::new();
    for i in 0..5 {
        inserted.push(store.insert(format!("payload-{i}")).await.unwrap());
    }

    let mut fetched = Vec::new();
    let mut cursor = CommandId::UNSET;
    while let Some(row) = store.fetch_pending_after(cursor).await.unwrap() {
        assert_eq!(row.status, CommandStatus::Pending);
        cursor = row.id;
        fetched.push(row.id);
    }
    assert_eq!(fetched, inserted);
    assert_eq!(store.pending_count().await.unwrap(), 5);
}

pub async fn completed_rows_are_never_fetched(store: &dyn CommandStore) {
    let a = store.insert("a".into()).await.unwrap();
    let b = store.insert("b".into()).await.unwrap();

    store.complete(a).await.unwrap();
    let row = store.fetch_oldest_pending().await.unwrap().unwrap();
    assert_eq!(row.id, b);
    assert_eq!(row.payload, "b");

    store.complete(b).await.unwrap();
    assert!(store.fetch_oldest_pending().await.unwrap().is_none());

    let counts = store.counts().await.unwrap();
    assert_eq!(counts.pending, 0);
    assert_eq!(counts.complete, 2);

    let row = store.get(a).await.unwrap().unwrap();
    assert_eq!(row.status, CommandStatus::Complete);
    assert!(row.completed_at.is_some());
}

pub async fn complete_twice_reports_already_complete(store: &dyn CommandStore) {
    let id = store.insert("x".into()).await.unwrap();
    store.complete(id).await.unwrap();

    let err = store.complete(id).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyComplete(got) if got == id));
    assert!(!err.is_fatal());
    assert_eq!(store.status(id).await.unwrap(), Some(CommandStatus::Complete));
}

pub async fn complete_missing_reports_not_found(store: &dyn CommandStore) {
    let err = store.complete(CommandId::new(404)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(got) if got == CommandId::new(404)));
    assert!(!err.is_fatal());
}

pub async fn cursor_skips_rows_at_or_below_it(store: &dyn CommandStore) {
    let a = store.insert("a".into()).await.unwrap();
    let b = store.insert("b".into()).await.unwrap();

    let row = store.fetch_pending_after(a).await.unwrap().unwrap();
    assert_eq!(row.id, b);
    assert!(store.fetch_pending_after(b).await.unwrap().is_none());

    // A row inserted later is still visible past the cursor.
    let c = store.insert("c".into()).await.unwrap();
    let row = store.fetch_pending_after(b).await.unwrap().unwrap();
    assert_eq!(row.id, c);
}

pub async fn concurrent_inserts_get_unique_ids(store: Arc<dyn CommandStore>) {
    let mut joins = Vec::new();
    for producer in 0..4 {
        let store = Arc::clone(&store);
        joins.push(tokio::spawn(async move {
            let mut ids = Vec::new();
            for i in 0..10 {
                ids.push(store.insert(format!("{producer}-{i}")).await.unwrap());
            }
            ids
        }));
    }

    let mut all = BTreeSet::new();
    for join in joins {
        for id in join.await.unwrap() {
            assert!(all.insert(id), "duplicate id {id}");
        }
    }
    assert_eq!(all.len(), 40);
    assert_eq!(store.pending_count().await.unwrap(), 40);
}

pub async fn complete_with_follow_ups_inserts_children_and_completes(store: &dyn CommandStore) {
    let parent = store.insert("parent".into()).await.unwrap();
    let sibling = store.insert("sibling".into()).await.unwrap();

    let children = store
        .complete_with_follow_ups(parent, vec!["c1".into(), "c2".into()])
        .await
        .unwrap();
    assert_eq!(children.len(), 2);
    assert!(children[0] > sibling);
    assert!(children[0] < children[1]);

    assert_eq!(store.status(parent).await.unwrap(), Some(CommandStatus::Complete));
    let first = store.get(children[0]).await.unwrap().unwrap();
    assert_eq!(first.status, CommandStatus::Pending);
    assert_eq!(first.payload, "c1");

    let counts = store.counts().await.unwrap();
    assert_eq!((counts.pending, counts.complete), (3, 1));
}

pub async fn complete_with_follow_ups_on_finished_parent_inserts_nothing(
    store: &dyn CommandStore,
) {
    let parent = store.insert("parent".into()).await.unwrap();
    store.complete(parent).await.unwrap();

    let err = store
        .complete_with_follow_ups(parent, vec!["child".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyComplete(got) if got == parent));

    let err = store
        .complete_with_follow_ups(CommandId::new(404), vec!["child".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    let counts = store.counts().await.unwrap();
    assert_eq!((counts.pending, counts.complete), (0, 1));
}
