//! spool-core
//!
//! Durable command queue with a single sequential worker.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（CommandId, CommandStatus, CommandEnvelope, Outcome）
//! - **typed**: 型付き Command API（Command trait, Handler trait, Registry, PayloadCodec）
//! - **store**: 永続化（CommandStore trait, SqliteStore, InMemoryStore）
//! - **worker**: fetch → execute → complete ループ
//! - **app**: AppBuilder（起動時検証とワイヤリング）
//! - **config**: WorkerConfig / SpoolConfig
//! - **error**: エラー型

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod store;
pub mod typed;
pub mod worker;

#[cfg(test)]
mod testing;

pub use app::{App, AppBuilder, BuildError};
pub use config::{SpoolConfig, WorkerConfig};
pub use domain::{CommandEnvelope, CommandId, CommandKind, CommandStatus, Outcome};
pub use error::{CodecError, CommandError, ExecuteError, StoreError, SubmitError, WorkerError};
pub use store::{CommandStore, InMemoryStore, QueueCounts, SqliteStore, StoredCommand, submit};
pub use typed::{Command, CommandContext, Handler, PayloadCodec, Registry, RegistryError};
pub use worker::{Step, Worker, WorkerHandle, WorkerReport};
