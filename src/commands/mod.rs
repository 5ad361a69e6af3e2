// src/commands/mod.rs

//! Command metadata and lookup.
//!
//! - [`CommandDescriptor`] holds a command's name, help text and optional
//!   handler.
//! - [`registry`] maps names and aliases to descriptors and answers `help`
//!   and `match` for the session.
//! - [`builtin`] contains the commands every registry starts with.

pub mod builtin;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use crate::context::{Completion, ExecutionContext};
use crate::errors::Result;
use crate::types::CommandArgs;

pub use registry::CommandRegistry;

/// Handler invoked for a command, either as the first stage of a pipeline or
/// when an upstream stage forwards output into it.
///
/// The handler gets the context of its own invocation (so it can `log`
/// further downstream), a snapshot of its arguments with `stdin` filled in,
/// and the completion for this unit of work. It may return before calling
/// `done`, as long as something eventually does.
pub type CommandHandler =
    Arc<dyn Fn(&ExecutionContext, CommandArgs, Completion) -> Result<()> + Send + Sync>;

/// Handler used when a descriptor has none: completes immediately.
pub fn noop_handler() -> CommandHandler {
    Arc::new(
        |_ctx: &ExecutionContext, _args: CommandArgs, done: Completion| -> Result<()> {
            done.done();
            Ok(())
        },
    )
}

#[derive(Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    pub usage: Option<String>,
    pub handler: Option<CommandHandler>,
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("usage", &self.usage)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            usage: None,
            handler: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ExecutionContext, CommandArgs, Completion) -> Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn handler_or_noop(&self) -> CommandHandler {
        self.handler.clone().unwrap_or_else(noop_handler)
    }
}
