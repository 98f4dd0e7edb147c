//! Command identifiers.
//!
//! ID は Store が insert 時に採番する単調増加の整数です。
//! FIFO の順序はこの値だけで決まります（タイムスタンプは使わない）。
//!
//! - 未保存のコマンドは `CommandId::UNSET`（0）
//! - SQLite の `INTEGER PRIMARY KEY AUTOINCREMENT` と 1:1 に対応

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a persisted command.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(i64);

impl CommandId {
    /// Sentinel for a command that has not been inserted yet.
    pub const UNSET: CommandId = CommandId(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_unset(self) -> bool {
        self == Self::UNSET
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::UNSET
    }
}

impl From<i64> for CommandId {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd-{}", self.0)
    }
}
