// src/session/sink.rs

//! Output sinks: where a pipeline's final stage writes.

use std::fmt::Debug;
use std::io::Write;

use crate::errors::Result;

/// Destination for values a command logs when it is not piped.
///
/// One call to `write` corresponds to one `log` call of the command: the
/// values arrive in the order and count they were logged.
pub trait OutputSink: Send + Sync + Debug {
    fn write(&self, values: &[String]) -> Result<()>;
}

/// Writes each call as one line on stdout, values joined by `separator`.
#[derive(Debug, Clone)]
pub struct StdoutSink {
    separator: String,
}

impl StdoutSink {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new(" ")
    }
}

impl OutputSink for StdoutSink {
    fn write(&self, values: &[String]) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", values.join(&self.separator))?;
        out.flush()?;
        Ok(())
    }
}
