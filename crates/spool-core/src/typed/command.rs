//! Command trait - 型付きコマンドの定義
//!
//! コマンドの「データ」側です。実行ロジックは `Handler<C>` に置き、
//! プリンタや fetcher などの依存は Handler が持ちます。

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Command は kind と payload 型を対応付ける
///
/// # 使用例
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct PrintDocument {
///     document: String,
/// }
///
/// impl Command for PrintDocument {
///     const KIND: &'static str = "documents.print.v1";
/// }
/// ```
///
/// # Trait Bounds
/// - `Serialize` / `DeserializeOwned`: Store への保存と復元
/// - `Send + Sync + 'static`: worker task をまたいで移動するため
pub trait Command: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// kind の定義（`{domain}.{action}.v{major}`）
    const KIND: &'static str;
}
