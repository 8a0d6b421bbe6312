//! `log` backend for the browser console.
//!
//! Native builds (CLI, tests) use `env_logger` instead; on those targets
//! this logger falls back to stderr so it can still be installed.

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::error::{ExportError, Result};

/// Routes `log` records to `console.error`/`warn`/`info`/`debug`.
///
/// Filtering is done by [`log::max_level`], set when the logger is installed.
pub struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            emit(
                record.level(),
                &format_line(record.level(), record.target(), &record.args().to_string()),
            );
        }
    }

    fn flush(&self) {}
}

/// `"[WARN inventory_reports::xlsx] message"`
pub fn format_line(level: Level, target: &str, message: &str) -> String {
    format!("[{level} {target}] {message}")
}

/// Parse a level name (`"warn"`, `"DEBUG"`, ...); unknown names give `None`.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    name.trim().parse().ok()
}

#[cfg(target_arch = "wasm32")]
fn emit(level: Level, line: &str) {
    use wasm_bindgen::JsValue;
    use web_sys::console;

    let line = JsValue::from_str(line);
    match level {
        Level::Error => console::error_1(&line),
        Level::Warn => console::warn_1(&line),
        Level::Info => console::info_1(&line),
        Level::Debug | Level::Trace => console::debug_1(&line),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(_level: Level, line: &str) {
    eprintln!("{line}");
}

/// Install [`ConsoleLogger`] as the global logger.
///
/// # Errors
/// Fails if a logger is already installed; the level is still updated.
pub fn init_console_logger(level: LevelFilter) -> Result<()> {
    log::set_max_level(level);
    log::set_logger(&LOGGER)
        .map_err(|e| ExportError::Other(format!("console logger not installed: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        assert_eq!(
            format_line(Level::Warn, "inventory_reports::xlsx", "name too long"),
            "[WARN inventory_reports::xlsx] name too long"
        );
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level(" WARN "), Some(LevelFilter::Warn));
        assert_eq!(parse_level("off"), Some(LevelFilter::Off));
        assert_eq!(parse_level("loud"), None);
    }
}
