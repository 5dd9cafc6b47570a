use std::path::PathBuf;

use flexi_logger::{Age, Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};
use once_cell::sync::OnceCell;

static LOGGER: OnceCell<LoggerHandle> = OnceCell::new();

/// Starts the file logger once per process. `RUST_LOG` overrides the
/// default `info` level.
pub fn init() -> anyhow::Result<()> {
    LOGGER.get_or_try_init(|| -> anyhow::Result<LoggerHandle> {
        let log_dir = log_dir();
        std::fs::create_dir_all(&log_dir)?;
        let handle = Logger::try_with_env_or_str("info")?
            .duplicate_to_stdout(Duplicate::Info)
            .log_to_file(FileSpec::default().directory(&log_dir).basename("reader"))
            .rotate(
                Criterion::AgeOrSize(Age::Day, 10_000_000),
                Naming::Numbers,
                Cleanup::KeepLogFiles(7),
            )
            .start()?;
        Ok(handle)
    })?;
    Ok(())
}

fn log_dir() -> PathBuf {
    std::env::var("READER_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("logs"))
}
