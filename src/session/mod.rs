// src/session/mod.rs

//! The shell session shared by every command invocation.
//!
//! A session owns:
//! - the output sink that unpiped commands write to ([`sink`])
//! - the input source that answers prompts ([`input`])
//! - the delimiter shown in front of the prompt
//! - a back-reference to the command registry (`parent`), used by `help`
//!   and `match`
//! - the pending-work counter ([`pending`]) that tells a coordinator when a
//!   pipeline has drained
//!
//! [`mock`] provides in-memory replacements for the sink and input source.

pub mod input;
pub mod mock;
pub mod pending;
pub mod sink;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::commands::CommandRegistry;
use crate::errors::{Result, ShellError};

pub use input::{InputSource, StdinInput};
pub use mock::{MemorySink, ScriptedInput};
pub use pending::{PendingCommand, PendingWork};
pub use sink::{OutputSink, StdoutSink};

pub const DEFAULT_DELIMITER: &str = "shellpipe$";

/// Cheaply cloneable handle to one shell session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    sink: Arc<dyn OutputSink>,
    input: Arc<dyn InputSource>,
    parent: Option<Arc<CommandRegistry>>,
    delimiter: Mutex<String>,
    pending: PendingWork,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("sink", &self.inner.sink)
            .field("delimiter", &self.delimiter(None))
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// The command registry this session belongs to.
    pub fn parent(&self) -> Option<&Arc<CommandRegistry>> {
        self.inner.parent.as_ref()
    }

    /// Write one logged value sequence to the output sink.
    pub fn log(&self, values: &[String]) -> Result<()> {
        self.inner.sink.write(values)
    }

    /// Ask the user a question and return the answer.
    ///
    /// An empty answer falls back to `default` when one is given.
    pub async fn prompt(&self, message: &str, default: Option<&str>) -> Result<String> {
        let text = match default {
            Some(d) => format!("{message} [{d}] "),
            None => format!("{message} "),
        };

        let answer = self.inner.input.read_line(&text).await?;
        let answer = answer.trim();

        match default {
            Some(d) if answer.is_empty() => Ok(d.to_string()),
            _ => Ok(answer.to_string()),
        }
    }

    /// Replace the delimiter when `new` is given; return the one in effect.
    pub fn delimiter(&self, new: Option<&str>) -> String {
        let mut guard = self
            .inner
            .delimiter
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(d) = new {
            debug!(delimiter = d, "session delimiter changed");
            *guard = d.to_string();
        }
        guard.clone()
    }

    /// Help for one command, or a listing of every command.
    pub fn help(&self, command: Option<&str>) -> Result<String> {
        let registry = self.parent().ok_or(ShellError::MissingRegistry)?;
        match command {
            Some(name) => registry.help_for(name),
            None => Ok(registry.help_listing()),
        }
    }

    /// Command names and aliases starting with `partial`, sorted.
    pub fn r#match(&self, partial: &str) -> Result<Vec<String>> {
        let registry = self.parent().ok_or(ShellError::MissingRegistry)?;
        Ok(registry.complete(partial))
    }

    /// Start one unit of asynchronous work.
    pub fn register_command(&self) -> PendingCommand {
        self.inner.pending.register()
    }

    /// Finish the unit of work `token` was issued for.
    pub fn complete_command(&self, token: PendingCommand) {
        self.inner.pending.complete(token)
    }

    /// Units registered but not yet completed.
    pub fn pending(&self) -> usize {
        self.inner.pending.count()
    }

    /// Resolve once every registered unit has completed.
    pub async fn wait_idle(&self) {
        self.inner.pending.wait_idle().await
    }

    /// Resolve once at most `baseline` units are outstanding.
    pub async fn wait_until(&self, baseline: usize) {
        self.inner.pending.wait_until(baseline).await
    }
}

/// Assembles a [`Session`]. Unset parts default to stdout, stdin, no
/// registry and [`DEFAULT_DELIMITER`].
#[derive(Default)]
pub struct SessionBuilder {
    sink: Option<Arc<dyn OutputSink>>,
    input: Option<Arc<dyn InputSource>>,
    parent: Option<Arc<CommandRegistry>>,
    delimiter: Option<String>,
}

impl SessionBuilder {
    pub fn sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn input(mut self, input: Arc<dyn InputSource>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn parent(mut self, registry: Arc<CommandRegistry>) -> Self {
        self.parent = Some(registry);
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn build(self) -> Session {
        Session {
            inner: Arc::new(SessionInner {
                sink: self.sink.unwrap_or_else(|| Arc::new(StdoutSink::default())),
                input: self.input.unwrap_or_else(|| Arc::new(StdinInput::new())),
                parent: self.parent,
                delimiter: Mutex::new(
                    self.delimiter
                        .unwrap_or_else(|| DEFAULT_DELIMITER.to_string()),
                ),
                pending: PendingWork::new(),
            }),
        }
    }
}
