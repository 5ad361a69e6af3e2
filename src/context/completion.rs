// src/context/completion.rs

use crate::session::{PendingCommand, Session};

/// Completion handle given to a downstream handler.
///
/// Calling [`Completion::done`] completes the unit of work registered for
/// this forward. `done` consumes the handle, so it runs at most once; a
/// handle that is dropped instead leaves the session busy.
#[derive(Debug)]
pub struct Completion {
    session: Session,
    token: PendingCommand,
}

impl Completion {
    pub(crate) fn new(session: Session, token: PendingCommand) -> Self {
        Self { session, token }
    }

    /// Identifier of the registered unit, for tracing.
    pub fn id(&self) -> u64 {
        self.token.id()
    }

    pub fn done(self) {
        let Completion { session, token } = self;
        session.complete_command(token);
    }
}
