//! App - アプリケーション層
//!
//! Registry を組み立てて Worker に渡すところまでを担当します。

pub mod builder;

pub use self::builder::{App, AppBuilder, BuildError};
