//! Process-wide rolling file logs.
//!
//! # Invariants
//! - At most one logger is started per process; later calls must ask for the
//!   exact same settings or they are refused.
//! - Nothing here panics.
//! - Events carry ids, sizes and durations only; never payload bytes,
//!   document names or tag values.

use crate::config::StoreConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::fmt::Display;
use std::panic::PanicHookInfo;
use std::path::PathBuf;

const LOG_FILE_BASENAME: &str = "snowy";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_PAYLOAD_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    level: &'static str,
    dir: PathBuf,
}

impl LogSettings {
    fn parse(level: &str, dir: &str) -> Result<Self, String> {
        let level = normalize_level(level)?;
        let dir = dir.trim();
        if dir.is_empty() {
            return Err("log_dir cannot be empty".to_string());
        }
        let dir = PathBuf::from(dir);
        if !dir.is_absolute() {
            return Err(format!(
                "log_dir must be an absolute path, got `{}`",
                dir.display()
            ));
        }
        Ok(Self { level, dir })
    }
}

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn start(settings: LogSettings) -> Result<Self, String> {
        std::fs::create_dir_all(&settings.dir).map_err(|err| {
            format!(
                "failed to create log directory `{}`: {err}",
                settings.dir.display()
            )
        })?;

        let handle = Logger::try_with_str(settings.level)
            .map_err(|err| format!("invalid log level `{}`: {err}", settings.level))?
            .log_to_file(
                FileSpec::default()
                    .directory(settings.dir.as_path())
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(ROTATE_AT_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        install_panic_hook();
        info!(
            "event=store_start module=core status=ok platform={} build_mode={} version={}",
            std::env::consts::OS,
            if cfg!(debug_assertions) { "debug" } else { "release" },
            env!("CARGO_PKG_VERSION")
        );
        info!(
            "event=logging_init module=core status=ok level={} log_dir={}",
            settings.level,
            settings.dir.display()
        );

        Ok(Self {
            settings,
            _handle: handle,
        })
    }

    fn confirm(&self, requested: &LogSettings) -> Result<(), String> {
        let active = &self.settings;
        if active.dir != requested.dir {
            return Err(refusal(
                "directory",
                active.dir.display(),
                requested.dir.display(),
            ));
        }
        if active.level != requested.level {
            return Err(refusal("level", active.level, requested.level));
        }
        Ok(())
    }
}

fn refusal(what: &str, active: impl Display, requested: impl Display) -> String {
    format!("logging already initialized with {what} `{active}`; refusing to switch to `{requested}`")
}

/// Starts file logging at `level` under the absolute directory `log_dir`.
///
/// Calling again with the same pair is a no-op.
///
/// # Errors
/// - Unknown `level`, or an empty or relative `log_dir`.
/// - A different pair than the one already active.
/// - The directory cannot be created or the backend fails to start.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let requested = LogSettings::parse(level, log_dir)?;
    ACTIVE
        .get_or_try_init(|| ActiveLogger::start(requested.clone()))?
        .confirm(&requested)
}

/// Starts logging when `config` names a log directory.
///
/// `Ok(false)` means file logging stays off; `Ok(true)` means it is active.
pub fn init_logging_from_config(config: &StoreConfig) -> Result<bool, String> {
    let Some(dir) = config.log_dir.as_deref() else {
        return Ok(false);
    };
    let dir = dir
        .to_str()
        .ok_or_else(|| format!("log_dir `{}` is not valid UTF-8", dir.display()))?;
    init_logging(config.log_level, dir).map(|()| true)
}

/// `(level, log_dir)` of the running logger, if one was started.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.settings.level, active.settings.dir.clone()))
}

/// `debug` in debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

pub(crate) fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            one_line(panic_message(info), PANIC_PAYLOAD_LIMIT)
        );
        previous(info);
    }));
}

fn panic_message<'a>(info: &'a PanicHookInfo<'_>) -> &'a str {
    let payload = info.payload();
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Flattens `value` to one line of at most `limit` chars plus an ellipsis.
fn one_line(value: &str, limit: usize) -> String {
    let mut chars = value.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c });
    let mut line: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        line.push_str("...");
    }
    line
}
