// src/session/pending.rs

//! Pending-work accounting for asynchronous pipeline forwards.
//!
//! Every forward into a downstream stage is one unit of work. The session
//! hands out a [`PendingCommand`] token when the unit is registered and
//! takes it back when the unit completes, so each registration can be
//! completed at most once. Tokens remember which counter issued them and
//! are refused by any other.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::Notify;
use tracing::{debug, warn};

/// Token for one registered unit of asynchronous work.
///
/// Not `Clone`: the only way to lower the session counter is to hand this
/// token back through `Session::complete_command`. Dropping it without doing
/// so leaves the counter raised.
#[must_use = "a registered command must be handed back to complete_command"]
#[derive(Debug)]
pub struct PendingCommand {
    id: u64,
    owner: u64,
    completed: bool,
}

impl PendingCommand {
    pub fn id(&self) -> u64 {
        self.id
    }
}

static NEXT_OWNER: AtomicU64 = AtomicU64::new(0);

impl Drop for PendingCommand {
    fn drop(&mut self) {
        if !self.completed {
            warn!(
                id = self.id,
                "pending command dropped without completion; session stays busy"
            );
        }
    }
}

/// Counter of outstanding forwards plus a wake-up for waiters.
#[derive(Debug)]
pub struct PendingWork {
    owner: u64,
    count: AtomicUsize,
    next_id: AtomicU64,
    changed: Notify,
}

impl Default for PendingWork {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingWork {
    pub fn new() -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            count: AtomicUsize::new(0),
            next_id: AtomicU64::new(0),
            changed: Notify::new(),
        }
    }

    /// Number of units registered but not yet completed.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub(crate) fn register(&self) -> PendingCommand {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let pending = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(id, pending, "registered pending command");
        PendingCommand {
            id,
            owner: self.owner,
            completed: false,
        }
    }

    pub(crate) fn complete(&self, mut token: PendingCommand) {
        if token.owner != self.owner {
            warn!(
                id = token.id,
                issued_by = token.owner,
                "completion for a command another session registered; ignoring"
            );
            return;
        }
        token.completed = true;

        let previous = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        match previous {
            Ok(n) => {
                debug!(id = token.id, pending = n - 1, "completed pending command");
                self.changed.notify_waiters();
            }
            Err(_) => {
                warn!(id = token.id, "completion with nothing pending; ignoring");
            }
        }
    }

    /// Resolve once no registered unit is outstanding.
    pub async fn wait_idle(&self) {
        self.wait_until(0).await
    }

    /// Resolve once at most `baseline` units are outstanding.
    pub async fn wait_until(&self, baseline: usize) {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // Register interest before checking so a completion landing in
            // between is not missed.
            notified.as_mut().enable();

            if self.count() <= baseline {
                return;
            }
            notified.await;
        }
    }
}
