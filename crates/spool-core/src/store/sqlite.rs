//! SQLite-backed store.
//!
//! - `Arc<Mutex<Connection>>` で排他制御（1 操作 = 1 ロック）
//! - 同期 API なので spawn_blocking で実行
//! - `PRAGMA user_version` でスキーマのバージョンを管理

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use super::{CommandStore, QueueCounts, StoredCommand};
use crate::domain::{CommandId, CommandStatus};
use crate::error::StoreError;

const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS commands (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  payload TEXT NOT NULL,
  status INTEGER NOT NULL DEFAULT 0,
  created_at TEXT NOT NULL,
  completed_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_commands_status_id ON commands (status, id);
"#;

const SELECT_COLUMNS: &str = "SELECT id, payload, status, created_at, completed_at FROM commands";

/// Durable store in a single SQLite table.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            StoreError::storage(format!("open sqlite store {}: {e}", path.display()))
        })?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(sql_err("busy_timeout"))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(sql_err("journal_mode"))?;
        debug!(path = %path.display(), "opened sqlite store");
        Self::from_connection(conn)
    }

    /// Private database that disappears with the handle.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(sql_err("open in-memory sqlite store"))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` on the blocking pool while holding the connection lock.
    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StoreError::storage(format!("{op}: sqlite store lock poisoned")))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::storage(format!("{op}: blocking task failed: {e}")))?
    }
}

#[async_trait]
impl CommandStore for SqliteStore {
    async fn insert(&self, payload: String) -> Result<CommandId, StoreError> {
        self.run("insert", move |conn| insert_row(conn, &payload, &timestamp(Utc::now())))
            .await
    }

    async fn fetch_pending_after(
        &self,
        cursor: CommandId,
    ) -> Result<Option<StoredCommand>, StoreError> {
        self.run("fetch_pending_after", move |conn| {
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE status = ?1 AND id > ?2 ORDER BY id ASC LIMIT 1"),
                params![CommandStatus::Pending.as_i64(), cursor.get()],
                row_to_command,
            )
            .optional()
            .map_err(sql_err("fetch_pending_after"))
        })
        .await
    }

    async fn complete(&self, id: CommandId) -> Result<(), StoreError> {
        self.run("complete", move |conn| complete_row(conn, id, &timestamp(Utc::now())))
            .await
    }

    /// Single transaction: either every follow-up is inserted and the parent
    /// is Complete, or nothing changed.
    async fn complete_with_follow_ups(
        &self,
        id: CommandId,
        follow_ups: Vec<String>,
    ) -> Result<Vec<CommandId>, StoreError> {
        self.run("complete_with_follow_ups", move |conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(sql_err("complete_with_follow_ups"))?;
            let now = timestamp(Utc::now());

            // dropping `tx` on an early return rolls back
            complete_row(&tx, id, &now)?;
            let mut ids = Vec::with_capacity(follow_ups.len());
            for payload in &follow_ups {
                ids.push(insert_row(&tx, payload, &now)?);
            }

            tx.commit().map_err(sql_err("complete_with_follow_ups"))?;
            Ok(ids)
        })
        .await
    }

    async fn get(&self, id: CommandId) -> Result<Option<StoredCommand>, StoreError> {
        self.run("get", move |conn| {
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.get()],
                row_to_command,
            )
            .optional()
            .map_err(sql_err("get"))
        })
        .await
    }

    async fn counts(&self) -> Result<QueueCounts, StoreError> {
        self.run("counts", |conn| {
            let mut stmt = conn
                .prepare("SELECT status, COUNT(*) FROM commands GROUP BY status")
                .map_err(sql_err("counts"))?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))
                .map_err(sql_err("counts"))?;

            let mut counts = QueueCounts::default();
            for row in rows {
                let (status, n) = row.map_err(sql_err("counts"))?;
                let n = usize::try_from(n).unwrap_or_default();
                match CommandStatus::from_i64(status) {
                    Some(CommandStatus::Pending) => counts.pending += n,
                    Some(CommandStatus::Complete) => counts.complete += n,
                    None => {}
                }
            }
            Ok(counts)
        })
        .await
    }
}

fn insert_row(conn: &Connection, payload: &str, now: &str) -> Result<CommandId, StoreError> {
    conn.execute(
        "INSERT INTO commands (payload, status, created_at) VALUES (?1, ?2, ?3)",
        params![payload, CommandStatus::Pending.as_i64(), now],
    )
    .map_err(sql_err("insert"))?;
    Ok(CommandId::new(conn.last_insert_rowid()))
}

/// Pending -> Complete, telling a missing row apart from a finished one.
fn complete_row(conn: &Connection, id: CommandId, now: &str) -> Result<(), StoreError> {
    let changed = conn
        .execute(
            "UPDATE commands SET status = ?1, completed_at = ?2 WHERE id = ?3 AND status = ?4",
            params![
                CommandStatus::Complete.as_i64(),
                now,
                id.get(),
                CommandStatus::Pending.as_i64(),
            ],
        )
        .map_err(sql_err("complete"))?;
    if changed == 1 {
        return Ok(());
    }

    let existing: Option<i64> = conn
        .query_row(
            "SELECT status FROM commands WHERE id = ?1",
            params![id.get()],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_err("complete"))?;
    match existing {
        Some(_) => Err(StoreError::AlreadyComplete(id)),
        None => Err(StoreError::NotFound(id)),
    }
}

fn ensure_schema(conn: &Connection) -> Result<(), StoreError> {
    let current: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(sql_err("read schema version"))?;
    if current > SCHEMA_VERSION {
        return Err(StoreError::storage(format!(
            "sqlite schema version {current} is newer than supported {SCHEMA_VERSION}"
        )));
    }
    if current < 1 {
        conn.execute_batch(SCHEMA_V1)
            .map_err(sql_err("apply schema v1"))?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(sql_err("record schema version"))?;
    }
    Ok(())
}

fn row_to_command(row: &Row<'_>) -> rusqlite::Result<StoredCommand> {
    let id: i64 = row.get(0)?;
    // Anything in the payload column is handed to the codec, which reports it.
    let payload = match row.get_ref(1)? {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Null => String::new(),
        other => format!("{other:?}"),
    };
    let raw_status: i64 = row.get(2)?;
    let status = CommandStatus::from_i64(raw_status)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(2, raw_status))?;
    let created_at: String = row.get(3)?;
    let completed_at: Option<String> = row.get(4)?;

    Ok(StoredCommand {
        id: CommandId::new(id),
        status,
        payload,
        created_at: parse_timestamp(3, &created_at)?,
        completed_at: completed_at
            .as_deref()
            .map(|raw| parse_timestamp(4, raw))
            .transpose()?,
    })
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn sql_err(op: &'static str) -> impl Fn(rusqlite::Error) -> StoreError {
    move |e| StoreError::storage(format!("{op}: {e}"))
}
