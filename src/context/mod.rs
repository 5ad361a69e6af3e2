// src/context/mod.rs

//! Per-invocation execution context.
//!
//! One [`ExecutionContext`] exists per command invocation, including one per
//! pipeline stage. Its job is output routing: every value sequence the
//! running command logs either goes to the session's output sink, or, when
//! the context has a `downstream` stage, into that stage's handler as
//! `stdin`. Each such forward is one registered unit of asynchronous work
//! on the session, completed through the [`Completion`] handed to the
//! handler.
//!
//! The context also forwards `prompt`, `delimiter`, `help` and `match` to
//! the session so a handler only ever needs the context it was given.

pub mod completion;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::commands::{CommandDescriptor, CommandHandler, CommandRegistry, noop_handler};
use crate::errors::{Result, ShellError};
use crate::session::Session;
use crate::types::CommandArgs;

pub use completion::Completion;

/// Callback the dispatcher attaches to an invocation; receives its outcome.
pub type CommandCallback = Box<dyn FnOnce(&Result<()>) + Send>;

/// What the dispatcher knows about the invocation; used to find the session.
#[derive(Debug, Clone, Default)]
pub struct CommandWrapper {
    pub session: Option<Session>,
}

impl CommandWrapper {
    pub fn new(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }
}

/// Construction bundle for [`ExecutionContext`]. Every field is optional.
#[derive(Default)]
pub struct ContextOptions {
    pub command: Option<String>,
    pub descriptor: Option<Arc<CommandDescriptor>>,
    pub args: Option<CommandArgs>,
    pub wrapper: Option<CommandWrapper>,
    pub callback: Option<CommandCallback>,
    pub downstream: Option<ExecutionContext>,
}

impl ContextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn descriptor(mut self, descriptor: Arc<CommandDescriptor>) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn args(mut self, args: CommandArgs) -> Self {
        self.args = Some(args);
        self
    }

    pub fn wrapper(mut self, wrapper: CommandWrapper) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    pub fn callback(mut self, callback: CommandCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn downstream(mut self, downstream: ExecutionContext) -> Self {
        self.downstream = Some(downstream);
        self
    }
}

/// Runtime object for one command invocation.
///
/// Cloning is cheap and yields a handle to the same invocation, which lets
/// an asynchronous handler move its context into a spawned task.
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    command: Option<String>,
    descriptor: Option<Arc<CommandDescriptor>>,
    args: Mutex<CommandArgs>,
    wrapper: Option<CommandWrapper>,
    callback: Mutex<Option<CommandCallback>>,
    downstream: Option<ExecutionContext>,
    session: Option<Session>,
    parent: Option<Arc<CommandRegistry>>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("command", &self.inner.command)
            .field("args", &*self.lock_args())
            .field("has_session", &self.inner.session.is_some())
            .field("downstream", &self.inner.downstream)
            .finish_non_exhaustive()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(ContextOptions::default())
    }
}

impl ExecutionContext {
    /// Build a context from `options`. Never fails: the session and parent
    /// are looked up from the wrapper but not validated here.
    pub fn new(options: ContextOptions) -> Self {
        let ContextOptions {
            command,
            descriptor,
            args,
            wrapper,
            callback,
            downstream,
        } = options;

        let session = wrapper.as_ref().and_then(|w| w.session.clone());
        let parent = session.as_ref().and_then(|s| s.parent().cloned());

        Self {
            inner: Arc::new(ContextInner {
                command,
                descriptor,
                args: Mutex::new(args.unwrap_or_default()),
                wrapper,
                callback: Mutex::new(callback),
                downstream,
                session,
                parent,
            }),
        }
    }

    pub fn command(&self) -> Option<&str> {
        self.inner.command.as_deref()
    }

    pub fn descriptor(&self) -> Option<&Arc<CommandDescriptor>> {
        self.inner.descriptor.as_ref()
    }

    /// Snapshot of the invocation's arguments.
    pub fn args(&self) -> CommandArgs {
        self.lock_args().clone()
    }

    /// Values piped in by the most recent upstream forward.
    pub fn stdin(&self) -> Option<Vec<String>> {
        self.lock_args().stdin.clone()
    }

    pub fn wrapper(&self) -> Option<&CommandWrapper> {
        self.inner.wrapper.as_ref()
    }

    pub fn session(&self) -> Result<&Session> {
        self.inner.session.as_ref().ok_or(ShellError::MissingSession)
    }

    pub fn parent(&self) -> Option<&Arc<CommandRegistry>> {
        self.inner.parent.as_ref()
    }

    pub fn downstream(&self) -> Option<&ExecutionContext> {
        self.inner.downstream.as_ref()
    }

    pub fn is_piped(&self) -> bool {
        self.inner.downstream.is_some()
    }

    /// Take the dispatcher callback. Returns `None` after the first call.
    pub fn take_callback(&self) -> Option<CommandCallback> {
        self.inner
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Emit output from the running command.
    ///
    /// Without a downstream the values go to the session sink in one call.
    /// With one, a unit of work is registered on the session, the values
    /// become the downstream's `stdin` and the downstream handler is invoked
    /// with a [`Completion`] for that unit. The handler may complete later;
    /// `log` returns as soon as it has been invoked.
    pub fn log<I, S>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let session = self.session()?;

        match self.downstream() {
            Some(downstream) => self.forward(session, downstream, values),
            None => {
                debug!(
                    command = ?self.command(),
                    values = values.len(),
                    "writing output to session sink"
                );
                session.log(&values)
            }
        }
    }

    fn forward(
        &self,
        session: &Session,
        downstream: &ExecutionContext,
        values: Vec<String>,
    ) -> Result<()> {
        let handler = downstream.handler();
        let token = session.register_command();

        // Snapshot taken before the call: the handler may log into its own
        // downstream, which must not find these args locked.
        let args = {
            let mut args = downstream.lock_args();
            args.stdin = Some(values);
            args.clone()
        };

        debug!(
            from = ?self.command(),
            to = ?downstream.command(),
            id = token.id(),
            "forwarding output downstream"
        );

        handler(downstream, args, Completion::new(session.clone(), token))
    }

    /// Handler of this context's command, or a no-op that completes at once.
    pub(crate) fn handler(&self) -> CommandHandler {
        self.inner
            .descriptor
            .as_ref()
            .map(|d| d.handler_or_noop())
            .unwrap_or_else(noop_handler)
    }

    pub async fn prompt(&self, message: &str, default: Option<&str>) -> Result<String> {
        self.session()?.prompt(message, default).await
    }

    pub fn delimiter(&self, new: Option<&str>) -> Result<String> {
        Ok(self.session()?.delimiter(new))
    }

    pub fn help(&self, command: Option<&str>) -> Result<String> {
        self.session()?.help(command)
    }

    pub fn r#match(&self, partial: &str) -> Result<Vec<String>> {
        self.session()?.r#match(partial)
    }

    fn lock_args(&self) -> MutexGuard<'_, CommandArgs> {
        self.inner
            .args
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySink, ScriptedInput};

    fn session(sink: &MemorySink) -> Session {
        Session::builder()
            .sink(Arc::new(sink.clone()))
            .input(Arc::new(ScriptedInput::new(["sure"])))
            .parent(Arc::new(CommandRegistry::with_builtins()))
            .build()
    }

    fn stage(session: &Session, descriptor: CommandDescriptor) -> ExecutionContext {
        ExecutionContext::new(
            ContextOptions::new()
                .command(descriptor.name.clone())
                .descriptor(Arc::new(descriptor))
                .wrapper(CommandWrapper::new(session.clone())),
        )
    }

    #[test]
    fn empty_construction_does_not_fail() {
        let ctx = ExecutionContext::default();
        assert!(ctx.command().is_none());
        assert!(ctx.descriptor().is_none());
        assert!(ctx.downstream().is_none());
        assert!(ctx.parent().is_none());
        assert_eq!(ctx.args(), CommandArgs::default());
        assert!(ctx.take_callback().is_none());
    }

    #[test]
    fn missing_session_surfaces_at_first_use() {
        let ctx = ExecutionContext::new(ContextOptions::new().wrapper(CommandWrapper::default()));
        assert!(matches!(ctx.log(["x"]), Err(ShellError::MissingSession)));
        assert!(matches!(ctx.help(None), Err(ShellError::MissingSession)));
    }

    #[test]
    fn parent_comes_from_session() {
        let sink = MemorySink::new();
        let session = session(&sink);
        let ctx = stage(&session, CommandDescriptor::new("a"));
        let parent = ctx.parent().expect("parent");
        assert!(Arc::ptr_eq(parent, session.parent().unwrap()));
    }

    #[test]
    fn unpiped_log_writes_once_without_accounting() {
        let sink = MemorySink::new();
        let session = session(&sink);
        let ctx = stage(&session, CommandDescriptor::new("a"));

        ctx.log(["a", "b"]).unwrap();

        assert_eq!(sink.calls(), vec![vec!["a", "b"]]);
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn piped_log_sets_stdin_and_balances() {
        let sink = MemorySink::new();
        let session = session(&sink);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let b = {
            let seen = Arc::clone(&seen);
            let observed = session.clone();
            stage(
                &session,
                CommandDescriptor::new("b").handler(move |_ctx, args, done| {
                    // Registered before the handler runs.
                    seen.lock().unwrap().push((observed.pending(), args.stdin.clone()));
                    done.done();
                    Ok(())
                }),
            )
        };
        let a = ExecutionContext::new(
            ContextOptions::new()
                .command("a")
                .wrapper(CommandWrapper::new(session.clone()))
                .downstream(b.clone()),
        );

        a.log(["hi"]).unwrap();

        assert_eq!(b.stdin(), Some(vec!["hi".to_string()]));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(1, Some(vec!["hi".to_string()]))]
        );
        assert_eq!(session.pending(), 0);
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn missing_handler_still_balances() {
        let sink = MemorySink::new();
        let session = session(&sink);
        let b = stage(&session, CommandDescriptor::new("b"));
        let a = ExecutionContext::new(
            ContextOptions::new()
                .wrapper(CommandWrapper::new(session.clone()))
                .downstream(b.clone()),
        );

        a.log(["x", "y"]).unwrap();

        assert_eq!(b.stdin(), Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn handler_error_propagates_to_logger() {
        let sink = MemorySink::new();
        let session = session(&sink);
        let b = stage(
            &session,
            CommandDescriptor::new("b").handler(|_ctx, _args, _done| {
                Err(ShellError::invalid_argument("b", "boom"))
            }),
        );
        let a = ExecutionContext::new(
            ContextOptions::new()
                .wrapper(CommandWrapper::new(session.clone()))
                .downstream(b),
        );

        let err = a.log(["x"]).unwrap_err();
        assert!(matches!(err, ShellError::InvalidArgument { .. }));
        // The handler dropped its completion, so the unit stays pending.
        assert_eq!(session.pending(), 1);
    }

    #[tokio::test]
    async fn forwards_shell_operations() {
        let sink = MemorySink::new();
        let session = session(&sink);
        let ctx = stage(&session, CommandDescriptor::new("a"));

        assert_eq!(ctx.prompt("continue?", None).await.unwrap(), "sure");
        assert_eq!(ctx.delimiter(Some("x$")).unwrap(), session.delimiter(None));
        assert_eq!(ctx.help(Some("echo")).unwrap(), session.help(Some("echo")).unwrap());
        assert_eq!(ctx.r#match("c").unwrap(), session.r#match("c").unwrap());
    }

    #[test]
    fn callback_is_taken_once() {
        let ctx = ExecutionContext::new(ContextOptions::new().callback(Box::new(|_: &Result<()>| {})));
        assert!(ctx.take_callback().is_some());
        assert!(ctx.take_callback().is_none());
    }
}
