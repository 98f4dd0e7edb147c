//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! - Builder パターン
//! - 起動時検証（Fail-fast 設計）

use std::sync::Arc;

use crate::store::CommandStore;
use crate::typed::{Command, Handler, Registry, RegistryError};
use crate::worker::Worker;

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .register::<PrintDocument, _>(Printer)?
///     .expect_kinds(&["documents.print.v1"])
///     .build()?;
/// let mut worker = app.worker(store);
/// ```
///
/// # Fail-fast 設計
/// - expect_kinds() で必要な kind を宣言
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
/// - 既存のキューに残っている kind を登録し忘れると、実行時に
///   Undecodable が積み上がるので起動時に落とす
pub struct AppBuilder {
    registry: Registry,
    expected_kinds: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing command kinds: {0:?}. These kinds were expected but not registered.")]
    MissingKinds(Vec<String>),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            expected_kinds: None,
        }
    }

    pub fn register<C: Command, H: Handler<C> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.registry.register::<C, H>(handler)?;
        Ok(self)
    }

    pub fn expect_kinds(mut self, kinds: &[&str]) -> Self {
        self.expected_kinds = Some(kinds.iter().map(|kind| kind.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        if let Some(expected_kinds) = &self.expected_kinds {
            let registered = self.registry.registered_kinds();
            let missing: Vec<String> = expected_kinds
                .iter()
                .filter(|kind| !registered.contains(kind))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingKinds(missing));
            }
        }
        Ok(App {
            registry: Arc::new(self.registry),
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated set of handlers; hands out workers bound to a store.
pub struct App {
    registry: Arc<Registry>,
}

impl App {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn worker(&self, store: Arc<dyn CommandStore>) -> Worker {
        Worker::new(store, Arc::clone(&self.registry))
    }
}
