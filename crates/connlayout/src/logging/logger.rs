// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

//! Global `log` backend routing records to an [`Output`].

use super::output::{LogLevel, Output};
use std::io;
use std::sync::{Arc, OnceLock};

/// Output of the installed backend; set only once `log` accepted it.
static OUTPUT: OnceLock<Arc<dyn Output>> = OnceLock::new();

/// `log::Log` implementation forwarding to one output.
struct OutputLogger {
    output: Arc<dyn Output>,
    level_filter: LogLevel,
}

impl log::Log for OutputLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        LogLevel::from(metadata.level()) >= self.level_filter
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Logging must never fail the caller.
        let _ = self
            .output
            .write(LogLevel::from(record.level()), &record.args().to_string());
    }

    fn flush(&self) {
        let _ = self.output.flush();
    }
}

/// Install `output` as the process `log` backend.
///
/// Only the first call wins; returns `false` when a logger (ours or any
/// other `log` backend) was already installed. A rejected output is
/// dropped and never flushed by [`flush_logger`].
pub fn init_logger(output: Arc<dyn Output>, level: LogLevel) -> bool {
    let logger = OutputLogger {
        output: Arc::clone(&output),
        level_filter: level,
    };
    if log::set_boxed_logger(Box::new(logger)).is_err() {
        return false;
    }
    // `set_boxed_logger` succeeds once per process, so this slot is empty.
    let _ = OUTPUT.set(output);
    log::set_max_level(level.to_filter());
    true
}

/// Flush the installed output. No-op if nothing was installed.
pub fn flush_logger() -> io::Result<()> {
    match OUTPUT.get() {
        Some(output) => output.flush(),
        None => Ok(()),
    }
}
