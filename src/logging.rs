use log::{LevelFilter, Metadata, Record};

const MAX_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Minimal backend for the `log` facade: level-prefixed lines on stderr,
/// keeping stdout free for interpreted program output.
pub struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(MAX_LOG_LEVEL);
    }
}
