//! Human-readable compilation log

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{error, info};

/// Append-only text log of a compilation
///
/// Each line is mirrored to `tracing` as it is appended.
#[derive(Debug, Default)]
pub struct CompilationLog {
    text: Mutex<String>,
}

impl CompilationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a progress line
    pub fn line(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        info!(target: "compiler", "{}", line);
        self.push(line);
    }

    /// Appends a failure line
    pub fn error(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        error!(target: "compiler", "{}", line);
        self.push(line);
    }

    /// Empties the log
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Returns a copy of the accumulated text
    pub fn contents(&self) -> String {
        self.lock().clone()
    }

    fn push(&self, line: &str) {
        let mut text = self.lock();
        text.push_str(line);
        text.push('\n');
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.text.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
