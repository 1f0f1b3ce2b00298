//! Ring-buffer logger feeding the TUI log panel.
//!
//! The terminal owns the screen while the client runs, so log lines go
//! into a bounded in-memory buffer that the UI renders as its bottom
//! panel. `CUECLOCK_LOG_STDERR=1` additionally echoes lines to stderr
//! for use with `--quiet` or a redirected terminal.

use log::{LevelFilter, Log, Metadata, Record};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};

const LOG_CAPACITY: usize = 500;

pub type LogBuffer = Arc<Mutex<VecDeque<String>>>;

struct RingLogger {
    level: LevelFilter,
    buffer: LogBuffer,
    echo_stderr: bool,
}

impl Log for RingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        if self.echo_stderr {
            eprintln!("{}", line);
        }

        let mut buffer = self.buffer.lock().unwrap();
        if buffer.len() >= LOG_CAPACITY {
            buffer.pop_front();
        }
        buffer.push_back(line);
    }

    fn flush(&self) {}
}

static LOG_BUFFER: OnceLock<LogBuffer> = OnceLock::new();
static LOGGER: OnceLock<RingLogger> = OnceLock::new();

/// Install the ring-buffer logger and hand back its buffer.
pub fn init() -> LogBuffer {
    let buffer = LOG_BUFFER
        .get_or_init(|| Arc::new(Mutex::new(VecDeque::with_capacity(LOG_CAPACITY))))
        .clone();

    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| raw.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    let echo_stderr = std::env::var("CUECLOCK_LOG_STDERR")
        .map(|value| value != "0")
        .unwrap_or(false);

    let logger_ref = LOGGER.get_or_init(|| RingLogger {
        level,
        buffer: buffer.clone(),
        echo_stderr,
    });
    if log::set_logger(logger_ref).is_ok() {
        log::set_max_level(level);
    }

    buffer
}

/// Copy the buffered lines for rendering.
pub fn snapshot(buffer: &LogBuffer) -> Vec<String> {
    buffer.lock().unwrap().iter().cloned().collect()
}
