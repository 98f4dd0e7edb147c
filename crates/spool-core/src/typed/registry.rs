//! Registry - kind → Handler の登録と管理
//!
//! - HashMap での型消去された trait object の管理
//! - Generic methods での登録と型安全性
//! - Arc による共有所有権

use std::collections::HashMap;
use std::sync::Arc;

use super::command::Command;
use super::handler::{CommandContext, DynHandler, Handler, TypedHandler};
use crate::domain::{CommandEnvelope, Outcome};
use crate::error::{CodecError, ExecuteError};

/// Registry は型付き Handler を登録・管理
///
/// # 使用例
/// ```ignore
/// let mut registry = Registry::new();
/// registry.register::<PrintDocument, _>(Printer)?;
///
/// let outcome = registry.dispatch(&ctx, envelope).await?;
/// ```
///
/// 起動時に組み立て、実行中は不変（ロック不要）。
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<String, Arc<dyn DynHandler>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler for command kind '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl Registry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<C: Command, H: Handler<C> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        let kind = C::KIND.to_string();
        if self.handlers.contains_key(&kind) {
            return Err(RegistryError::AlreadyRegistered(kind));
        }
        self.handlers
            .insert(kind, Arc::new(TypedHandler::<C, H>::new(handler)));
        Ok(())
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(kind).cloned()
    }

    /// Registered kinds, sorted.
    pub fn registered_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.handlers.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Decode `envelope` into its concrete type and run the matching handler.
    pub async fn dispatch(
        &self,
        ctx: &CommandContext,
        envelope: CommandEnvelope,
    ) -> Result<Outcome, ExecuteError> {
        let handler = self
            .get(envelope.kind().as_str())
            .ok_or_else(|| CodecError::UnknownKind(envelope.kind().clone()))?;
        handler.handle_dyn(ctx, envelope).await
    }
}
