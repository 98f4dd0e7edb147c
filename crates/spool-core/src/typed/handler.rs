//! Handler trait - Command を実行する Handler の定義
//!
//! - ジェネリック trait (Handler<C>)
//! - Object-safe trait (DynHandler)
//! - Type erasure (TypedHandler<C, H> → DynHandler)

use std::marker::PhantomData;

use async_trait::async_trait;

use super::command::Command;
use crate::domain::{CommandEnvelope, CommandId, CommandKind, Outcome};
use crate::error::{CommandError, ExecuteError};

/// Identity of the command being executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    id: CommandId,
    kind: CommandKind,
}

impl CommandContext {
    pub fn new(id: CommandId, kind: CommandKind) -> Self {
        Self { id, kind }
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }
}

/// Handler は Command を実行して Outcome を返す
///
/// `Ok(outcome)` を返すとそのコマンドは完了扱いになり、
/// `Err(CommandError::WorkFailed)` なら Pending のまま残ります。
///
/// # 使用例
/// ```ignore
/// struct Printer;
///
/// #[async_trait]
/// impl Handler<PrintDocument> for Printer {
///     async fn handle(&self, _ctx: &CommandContext, cmd: PrintDocument) -> Result<Outcome, CommandError> {
///         println!("printing {}", cmd.document);
///         Ok(Outcome::done())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<C: Command>: Send + Sync {
    async fn handle(&self, ctx: &CommandContext, command: C) -> Result<Outcome, CommandError>;
}

/// DynHandler は object-safe な Handler の抽象化
///
/// envelope の decode もここで行うので、payload が型に合わなければ
/// `ExecuteError::Decode` になります。
#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(
        &self,
        ctx: &CommandContext,
        envelope: CommandEnvelope,
    ) -> Result<Outcome, ExecuteError>;

    fn kind(&self) -> &'static str;
}

pub struct TypedHandler<C: Command, H: Handler<C>> {
    handler: H,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Command, H: Handler<C>> TypedHandler<C, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<C: Command, H: Handler<C>> DynHandler for TypedHandler<C, H> {
    async fn handle_dyn(
        &self,
        ctx: &CommandContext,
        envelope: CommandEnvelope,
    ) -> Result<Outcome, ExecuteError> {
        let command: C = envelope.into_command()?;
        Ok(self.handler.handle(ctx, command).await?)
    }

    fn kind(&self) -> &'static str {
        C::KIND
    }
}
