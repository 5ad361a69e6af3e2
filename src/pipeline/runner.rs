// src/pipeline/runner.rs

//! Drives one pipeline to completion.
//!
//! The runner plays the coordinator role the execution context relies on:
//! it registers the first stage's invocation with the session, dispatches
//! it, and then waits until the session's pending-work counter is back to
//! where it stood before dispatch, i.e. until every forward triggered along
//! the chain has completed. Units leaked by an earlier failed pipeline stay
//! counted but do not hold up later runs.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::commands::CommandRegistry;
use crate::context::{
    CommandCallback, CommandWrapper, Completion, ContextOptions, ExecutionContext,
};
use crate::errors::{Result, ShellError};
use crate::pipeline::{StageSpec, render_line};
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct PipelineRunner {
    session: Session,
    registry: Arc<CommandRegistry>,
    drain_timeout: Option<Duration>,
}

impl PipelineRunner {
    /// Runner over `session`, resolving commands through the session's
    /// parent registry.
    pub fn new(session: Session) -> Result<Self> {
        let registry = session
            .parent()
            .cloned()
            .ok_or(ShellError::MissingRegistry)?;
        Ok(Self {
            session,
            registry,
            drain_timeout: None,
        })
    }

    pub fn with_drain_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Build the linked contexts for `stages` and return the first one.
    ///
    /// Contexts are built back to front so every `downstream` is complete
    /// before it is linked. `callback` is attached to the first stage.
    pub fn build(
        &self,
        stages: &[StageSpec],
        callback: Option<CommandCallback>,
    ) -> Result<ExecutionContext> {
        if stages.is_empty() {
            return Err(ShellError::EmptyPipeline);
        }

        let descriptors = stages
            .iter()
            .map(|stage| self.registry.resolve(&stage.name))
            .collect::<Result<Vec<_>>>()?;

        let mut callback = callback;
        let mut next: Option<ExecutionContext> = None;

        for (index, (stage, descriptor)) in stages.iter().zip(descriptors).enumerate().rev() {
            let mut options = ContextOptions::new()
                .command(stage.name.clone())
                .descriptor(descriptor)
                .args(stage.args.clone())
                .wrapper(CommandWrapper::new(self.session.clone()));

            if let Some(downstream) = next.take() {
                options = options.downstream(downstream);
            }
            if index == 0 {
                if let Some(cb) = callback.take() {
                    options = options.callback(cb);
                }
            }

            next = Some(ExecutionContext::new(options));
        }

        next.ok_or(ShellError::EmptyPipeline)
    }

    pub async fn run(&self, stages: &[StageSpec]) -> Result<()> {
        self.run_with_callback(stages, None).await
    }

    /// Run `stages` and hand the outcome to `callback` once the pipeline has
    /// drained (or failed). Errors from resolving the stages are returned
    /// before any context exists; the callback is not invoked for them.
    pub async fn run_with_callback(
        &self,
        stages: &[StageSpec],
        callback: Option<CommandCallback>,
    ) -> Result<()> {
        let head = self.build(stages, callback)?;
        info!(line = %render_line(stages), "running pipeline");

        let outcome = self.dispatch(&head).await;

        match &outcome {
            Ok(()) => info!("pipeline finished"),
            Err(e) => warn!(error = %e, pending = self.session.pending(), "pipeline failed"),
        }

        if let Some(cb) = head.take_callback() {
            cb(&outcome);
        }

        outcome
    }

    async fn dispatch(&self, head: &ExecutionContext) -> Result<()> {
        let handler = head.handler();
        let baseline = self.session.pending();
        let done = Completion::new(self.session.clone(), self.session.register_command());
        debug!(command = ?head.command(), id = done.id(), baseline, "dispatching first stage");

        handler(head, head.args(), done)?;
        self.drain(baseline).await
    }

    async fn drain(&self, baseline: usize) -> Result<()> {
        match self.drain_timeout {
            None => {
                self.session.wait_until(baseline).await;
                Ok(())
            }
            Some(limit) => tokio::time::timeout(limit, self.session.wait_until(baseline))
                .await
                .map_err(|_| ShellError::DrainTimeout {
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    pending: self.session.pending().saturating_sub(baseline),
                }),
        }
    }
}
