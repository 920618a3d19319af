// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Minimal `log` backend writing to stderr, so the report on stdout stays
//! clean.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{self, Write};

pub struct StderrLogger {
    max_level: LevelFilter,
}

impl StderrLogger {
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    /// Call once, before any parsing.
    pub fn init(self) -> Result<(), SetLoggerError> {
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Format: "[LEVEL] target: message"
        eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}
