use std::sync::Arc;

use shellpipe::commands::{CommandDescriptor, CommandRegistry};
use shellpipe::context::{CommandWrapper, ContextOptions, ExecutionContext};
use shellpipe::session::{MemorySink, ScriptedInput, Session};
use shellpipe::types::CommandArgs;

/// A session wired to in-memory output and scripted prompt answers.
pub struct TestShell {
    pub session: Session,
    pub sink: MemorySink,
    pub input: Arc<ScriptedInput>,
}

/// Builder for [`TestShell`].
pub struct TestShellBuilder {
    registry: CommandRegistry,
    answers: Vec<String>,
    delimiter: Option<String>,
}

impl TestShellBuilder {
    /// Starts from the built-in commands.
    pub fn new() -> Self {
        Self {
            registry: CommandRegistry::with_builtins(),
            answers: Vec::new(),
            delimiter: None,
        }
    }

    /// Starts from an empty registry.
    pub fn empty() -> Self {
        Self {
            registry: CommandRegistry::new(),
            ..Self::new()
        }
    }

    pub fn with_command(mut self, descriptor: CommandDescriptor) -> Self {
        self.registry.register(descriptor);
        self
    }

    pub fn with_alias(mut self, alias: &str, target: &str) -> Self {
        self.registry
            .alias(alias, target)
            .expect("Failed to register alias in test shell");
        self
    }

    pub fn with_answer(mut self, answer: &str) -> Self {
        self.answers.push(answer.to_string());
        self
    }

    pub fn with_delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = Some(delimiter.to_string());
        self
    }

    pub fn build(self) -> TestShell {
        let sink = MemorySink::new();
        let input = Arc::new(ScriptedInput::new(self.answers));

        let mut builder = Session::builder()
            .sink(Arc::new(sink.clone()))
            .input(input.clone())
            .parent(Arc::new(self.registry));
        if let Some(d) = self.delimiter {
            builder = builder.delimiter(d);
        }

        TestShell {
            session: builder.build(),
            sink,
            input,
        }
    }
}

impl Default for TestShellBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestShell {
    /// A single unpiped context for `descriptor`.
    pub fn context(&self, descriptor: CommandDescriptor) -> ExecutionContext {
        self.context_with(descriptor, CommandArgs::new(), None)
    }

    pub fn context_with(
        &self,
        descriptor: CommandDescriptor,
        args: CommandArgs,
        downstream: Option<ExecutionContext>,
    ) -> ExecutionContext {
        let mut options = ContextOptions::new()
            .command(descriptor.name.clone())
            .descriptor(Arc::new(descriptor))
            .args(args)
            .wrapper(CommandWrapper::new(self.session.clone()));
        if let Some(d) = downstream {
            options = options.downstream(d);
        }
        ExecutionContext::new(options)
    }

    /// Link `stages` into a pipeline. Returns every context, head first.
    pub fn chain(&self, stages: Vec<CommandDescriptor>) -> Vec<ExecutionContext> {
        let mut contexts: Vec<ExecutionContext> = Vec::with_capacity(stages.len());
        for descriptor in stages.into_iter().rev() {
            let downstream = contexts.last().cloned();
            contexts.push(self.context_with(descriptor, CommandArgs::new(), downstream));
        }
        contexts.reverse();
        contexts
    }
}
