//! Logger setup
//!
//! File logging with size rotation through an async writer, or plain stderr
//! when no log directory is configured. Records at or above
//! `LogSettings::stderr` are also copied to stderr so rejected reloads show
//! up on the console.

use std::sync::Mutex;

use flexi_logger::{
    detailed_format, Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
    WriteMode,
};

use crate::settings::LogSettings;

/// Kept so `shutdown` can flush
static LOGGER_HANDLE: Mutex<Option<LoggerHandle>> = Mutex::new(None);

/// Level name to stderr duplication; unknown names duplicate nothing
fn duplicate(level: &str) -> Duplicate {
    match level.to_ascii_lowercase().as_str() {
        "error" => Duplicate::Error,
        "warn" => Duplicate::Warn,
        "info" => Duplicate::Info,
        "debug" => Duplicate::Debug,
        "trace" => Duplicate::Trace,
        "all" => Duplicate::All,
        _ => Duplicate::None,
    }
}

/// Start logging as `settings` describe
pub fn init(settings: &LogSettings) -> Result<(), FlexiLoggerError> {
    let logger = Logger::try_with_str(&settings.level)?.format(detailed_format);
    let handle = if settings.dir.is_empty() {
        logger.log_to_stderr().write_mode(WriteMode::Direct).start()?
    } else {
        logger
            .log_to_file(
                FileSpec::default()
                    .basename(&settings.file)
                    .directory(&settings.dir),
            )
            .rotate(
                Criterion::Size(settings.max_file_size),
                Naming::Numbers,
                Cleanup::KeepLogFiles(settings.max_files),
            )
            .duplicate_to_stderr(duplicate(&settings.stderr))
            .write_mode(WriteMode::Async)
            .append()
            .start()?
    };

    if let Ok(mut guard) = LOGGER_HANDLE.lock() {
        *guard = Some(handle);
    }

    if settings.dir.is_empty() {
        log::info!("logging to stderr at {}", settings.level);
    } else {
        log::info!("logging to {}/{} at {}", settings.dir, settings.file, settings.level);
    }
    Ok(())
}

/// Flush and stop; blocks until the async writer is done
pub fn shutdown() {
    if let Ok(mut guard) = LOGGER_HANDLE.lock() {
        if let Some(handle) = guard.take() {
            handle.flush();
        }
    }
}

pub fn is_initialized() -> bool {
    LOGGER_HANDLE
        .lock()
        .map(|guard| guard.is_some())
        .unwrap_or(false)
}
