//! Logging for rag-chat.
use anyhow::Context;
use rag_chat_core::get_data_dir;
use std::io::LineWriter;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::{FormatTime, OffsetTime, UtcTime};

const MAX_LOG_BYTES: u64 = 100 * 1024;
const DEFAULT_FILTER: &str = "rag_chat=debug,rag_chat_core=debug,rustyline=info";

/// Sends tracing output to `<data_dir>/rag-chat.log`.
///
/// The log is rotated to `rag-chat.log.old` once it grows past 100KB.
/// `RUST_LOG` overrides the default filter. Timestamps use the local offset
/// when it can be determined and UTC otherwise.
pub fn setup_logging() -> anyhow::Result<()> {
    let data_dir = get_data_dir().context("Failed to get data directory")?;
    let log_path = data_dir.join("rag-chat.log");
    rotate_if_large(&log_path, &data_dir.join("rag-chat.log.old"), MAX_LOG_BYTES)
        .context("Failed to rotate log file")?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    let writer = Mutex::new(LineWriter::new(log_file));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // The local offset is unknown to `time` once other threads are running
    match OffsetTime::local_rfc_3339() {
        Ok(timer) => init_subscriber(timer, writer, filter),
        Err(_) => init_subscriber(UtcTime::rfc_3339(), writer, filter),
    }
}

fn init_subscriber<T, W>(timer: T, writer: W, filter: EnvFilter) -> anyhow::Result<()>
where
    T: FormatTime + Send + Sync + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(timer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))
}

/// Moves `log_path` to `backup_path` when it is larger than `max_bytes`,
/// replacing any earlier backup. Returns whether a rotation happened.
fn rotate_if_large(log_path: &Path, backup_path: &Path, max_bytes: u64) -> std::io::Result<bool> {
    if !log_path.exists() || std::fs::metadata(log_path)?.len() <= max_bytes {
        return Ok(false);
    }
    if backup_path.exists() {
        std::fs::remove_file(backup_path)?;
    }
    std::fs::rename(log_path, backup_path)?;
    Ok(true)
}
