use std::sync::Arc;

use crossterm::style::{StyledContent, Stylize};
use jiff::Timestamp;
use log::{Level, LevelFilter, Log};
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub struct LogMsg {
    pub time: Timestamp,
    pub level: Level,
    pub content: String,
}

impl LogMsg {
    pub fn styled_level(&self) -> StyledContent<String> {
        let level = format!("{:5}", self.level);
        match self.level {
            Level::Error => level.bold().red(),
            Level::Warn => level.bold().yellow(),
            Level::Info => level.bold().green(),
            Level::Debug => level.bold().blue(),
            Level::Trace => level.bold().magenta(),
        }
    }
}

/// Prints all error messages when dropped.
pub struct LoggerGuard {
    messages: Arc<Mutex<Vec<LogMsg>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let guard = self.messages.lock();
        let mut error_encountered = false;
        for msg in &*guard {
            if msg.level == Level::Error {
                if !error_encountered {
                    eprintln!();
                    eprintln!("The following errors occurred while rollcall was running:");
                }
                error_encountered = true;
                eprintln!("{}", msg.content);
            }
        }
        if error_encountered {
            eprintln!();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Logger {
    messages: Arc<Mutex<Vec<LogMsg>>>,
}

impl Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= Level::Info || metadata.target().starts_with("rollcall")
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        self.messages.lock().push(LogMsg {
            time: Timestamp::now(),
            level: record.level(),
            content: format!("<{}> {}", record.target(), record.args()),
        });
    }

    fn flush(&self) {}
}

impl Logger {
    /// A logger that isn't installed globally.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(verbose: bool) -> (Self, LoggerGuard) {
        let logger = Self::new();
        let guard = LoggerGuard {
            messages: logger.messages.clone(),
        };

        log::set_max_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });

        log::set_boxed_logger(Box::new(logger.clone())).expect("logger already set");

        (logger, guard)
    }

    /// The last `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> Vec<LogMsg> {
        let guard = self.messages.lock();
        guard[guard.len().saturating_sub(n)..].to_vec()
    }
}
