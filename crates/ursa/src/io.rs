//! Output abstraction for the `debug` native function.
//!
//! Implement `PrintWriter` to capture or redirect output from embedded
//! programs; the default `StdPrint` writes lines to stdout.

use std::io::{self, Write as _};

/// Trait for handling output from the `debug` native function.
pub trait PrintWriter {
    /// Writes one complete output line (without a trailing newline).
    fn write_line(&mut self, line: &str);
}

/// Default writer: lines go to stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn write_line(&mut self, line: &str) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{line}");
    }
}

/// A writer that collects all output into a string, for tests and
/// embedders that surface output themselves.
#[derive(Debug, Default)]
pub struct CollectStringPrint {
    output: String,
}

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected output, one line per `write_line` call.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }
}

impl PrintWriter for CollectStringPrint {
    fn write_line(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}
