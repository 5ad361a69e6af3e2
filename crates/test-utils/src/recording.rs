use std::sync::{Arc, Mutex};

use shellpipe::commands::CommandDescriptor;
use shellpipe::context::Completion;

/// Records what each handler invocation received on stdin, and can hold
/// completions back so tests decide when (and in what order) units finish.
#[derive(Clone, Default)]
pub struct Recorder {
    inputs: Arc<Mutex<Vec<Vec<String>>>>,
    held: Arc<Mutex<Vec<Completion>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records stdin and completes immediately.
    pub fn completing(&self, name: &str) -> CommandDescriptor {
        let inputs = Arc::clone(&self.inputs);
        CommandDescriptor::new(name).handler(move |_ctx, args, done| {
            inputs.lock().unwrap().push(args.stdin.unwrap_or_default());
            done.done();
            Ok(())
        })
    }

    /// Records stdin and keeps the completion until released.
    pub fn holding(&self, name: &str) -> CommandDescriptor {
        let inputs = Arc::clone(&self.inputs);
        let held = Arc::clone(&self.held);
        CommandDescriptor::new(name).handler(move |_ctx, args, done| {
            inputs.lock().unwrap().push(args.stdin.unwrap_or_default());
            held.lock().unwrap().push(done);
            Ok(())
        })
    }

    /// Records stdin, logs it unchanged to its own downstream, completes.
    pub fn forwarding(&self, name: &str) -> CommandDescriptor {
        let inputs = Arc::clone(&self.inputs);
        CommandDescriptor::new(name).handler(move |ctx, args, done| {
            let values = args.stdin.unwrap_or_default();
            inputs.lock().unwrap().push(values.clone());
            ctx.log(values)?;
            done.done();
            Ok(())
        })
    }

    pub fn inputs(&self) -> Vec<Vec<String>> {
        self.inputs.lock().unwrap().clone()
    }

    /// Number of completions currently held back.
    pub fn held(&self) -> usize {
        self.held.lock().unwrap().len()
    }

    /// Complete the held unit at `index` (in arrival order of the ones
    /// still held).
    pub fn release(&self, index: usize) {
        let done = self.held.lock().unwrap().remove(index);
        done.done();
    }

    pub fn release_all(&self) {
        let held: Vec<Completion> = self.held.lock().unwrap().drain(..).collect();
        for done in held {
            done.done();
        }
    }
}
