use thiserror::Error;

use crate::domain::{CommandId, CommandKind};

/// Stored bytes could not be turned back into a runnable command (or the
/// other way round). The row stays in the store untouched.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed command bytes: {0}")]
    Malformed(String),

    #[error("unknown command kind '{0}'")]
    UnknownKind(CommandKind),

    #[error("command kind mismatch: expected '{expected}', found '{found}'")]
    KindMismatch {
        expected: &'static str,
        found: CommandKind,
    },

    #[error("payload for '{kind}' does not fit its type: {message}")]
    Payload { kind: CommandKind, message: String },

    #[error("failed to encode command: {0}")]
    Encode(String),
}

/// The action behind a command failed. The command stays Pending.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("work failed: {0}")]
    WorkFailed(String),
}

impl CommandError {
    pub fn work_failed(message: impl Into<String>) -> Self {
        Self::WorkFailed(message.into())
    }
}

impl From<CodecError> for CommandError {
    fn from(err: CodecError) -> Self {
        Self::WorkFailed(format!("could not build follow-up: {err}"))
    }
}

/// Result of dispatching one decoded envelope to its handler.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Decode(#[from] CodecError),

    #[error(transparent)]
    Work(#[from] CommandError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("command {0} not found")]
    NotFound(CommandId),

    #[error("command {0} is already complete")]
    AlreadyComplete(CommandId),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Storage failures stop the worker; bookkeeping mismatches do not.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Storage(_))
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    #[error("worker task aborted: {0}")]
    Aborted(String),
}
