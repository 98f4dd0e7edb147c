//! tracing の初期化
//!
//! - 診断ログ: `RUST_LOG` で制御、stderr に出力
//! - コマンドの出力（印刷しました、等）は Transcript 経由で stdout に出す

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "spool=info,spool_core=info,warn";

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; falls back to info for the spool crates.
///
/// # Example
/// ```bash
/// RUST_LOG=spool_core=debug spool work
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
