//! CommandEnvelope - kind と payload の運搬用データ
//!
//! Codec が保存するのはこの envelope だけです。
//! id と status は Store の列が正本なので envelope には含めません。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CodecError;
use crate::typed::Command;

/// Discriminator that selects the concrete command type and its handler.
///
/// # 命名規約
/// - `{domain}.{action}.v{major}`
/// - 例: `documents.print.v1`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandKind(String);

impl CommandKind {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Tagged variant `{kind, payload}` for any registered command type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    kind: CommandKind,
    payload: serde_json::Value,
}

impl CommandEnvelope {
    pub fn new(kind: CommandKind, payload: serde_json::Value) -> Self {
        Self { kind, payload }
    }

    /// Wrap a typed command.
    pub fn from_command<C: Command>(command: &C) -> Result<Self, CodecError> {
        let payload =
            serde_json::to_value(command).map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(Self::new(CommandKind::new(C::KIND), payload))
    }

    /// Unwrap into a typed command, checking the discriminator first.
    pub fn into_command<C: Command>(self) -> Result<C, CodecError> {
        if self.kind.as_str() != C::KIND {
            return Err(CodecError::KindMismatch {
                expected: C::KIND,
                found: self.kind,
            });
        }
        serde_json::from_value(self.payload).map_err(|e| CodecError::Payload {
            kind: self.kind,
            message: e.to_string(),
        })
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn into_parts(self) -> (CommandKind, serde_json::Value) {
        (self.kind, self.payload)
    }
}
