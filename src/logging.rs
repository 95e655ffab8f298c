use std::path::Path;

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};

const LOG_BASENAME: &str = "ember_daybook";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

/// Starts file-based logging under the state directory. The dashboard owns
/// the terminal, so diagnostics must never go to stdout/stderr while it
/// runs. The returned handle flushes on drop; keep it alive in `main`.
pub fn init_logging(log_dir: &Path) -> Result<LoggerHandle, String> {
    std::fs::create_dir_all(log_dir)
        .map_err(|err| format!("failed to create log directory {}: {err}", log_dir.display()))?;

    Logger::try_with_env_or_str("info")
        .map_err(|err| format!("invalid log spec: {err}"))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))
}
