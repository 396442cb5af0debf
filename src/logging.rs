use std::io::{IsTerminal, Write};

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let stderr = std::io::stderr();
        let mut stderr = stderr.lock();
        let _ = if stderr.is_terminal() {
            writeln!(
                stderr,
                "\u{1B}[{}m[{}] {}\u{1B}[0m",
                color(record.level()),
                tag(record.level()),
                record.args()
            )
        } else {
            writeln!(stderr, "[{}] {}", tag(record.level()), record.args())
        };
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

pub(crate) fn color(level: Level) -> u8 {
    match level {
        Level::Error => 31, // Red
        Level::Warn => 93,  // BrightYellow
        Level::Info => 34,  // Blue
        Level::Debug => 32, // Green
        Level::Trace => 90, // BrightBlack
    }
}

pub(crate) fn tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERR",
        Level::Warn => "WRN",
        Level::Info => "INF",
        Level::Debug => "DBG",
        Level::Trace => "TRC",
    }
}

/// Install the stderr logger. Fails if a logger is already installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    static LOGGER: StderrLogger = StderrLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
