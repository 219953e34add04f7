//! Laundry shop management core: order intake with per-kg and per-item
//! pricing, status tracking, WhatsApp receipt (nota) composition, and
//! dashboard reporting, backed by a local SQLite store.

use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod catalog;
pub mod db;
pub mod error;
pub mod models;
pub mod orders;
pub mod pricing;
pub mod profile;
pub mod receipt;
pub mod report;

pub use error::StoreError;

/// Initialize structured logging (console, plus a daily rolling file
/// when `log_dir` is given).
///
/// The returned guard must be kept alive for the lifetime of the
/// process; dropping it flushes and stops the file writer.
pub fn init_logging(
    log_dir: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, StoreError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,laundry_pos=debug"));

    let console_layer = fmt::layer().with_target(true);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "laundry");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .with(file_layer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .init();
            Ok(None)
        }
    }
}
