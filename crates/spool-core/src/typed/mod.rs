//! Typed - 型付き Command API
//!
//! kind の typo を型で排除し、Handler との対応付けを静的に保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Command` trait, `Handler<C>` trait - 型安全
//! - **内部（Dyn）**: `DynHandler` trait - object-safe, type erasure

pub mod codec;
pub mod command;
pub mod handler;
pub mod registry;

pub use self::codec::PayloadCodec;
pub use self::command::Command;
pub use self::handler::{CommandContext, DynHandler, Handler, TypedHandler};
pub use self::registry::{Registry, RegistryError};
