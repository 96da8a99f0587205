//! Supervised pool of push sessions.
//!
//! Every accepted upgrade becomes one task in a `JoinSet`. Finished tasks are
//! reaped on each accept, the cap is enforced before spawning, and shutdown
//! joins everything (aborting stragglers after a grace period).

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// How a pool shutdown went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Tasks that finished on their own within the grace period.
    pub joined: usize,
    /// Tasks aborted after the grace period.
    pub aborted: usize,
}

pub struct PushPool {
    tasks: JoinSet<()>,
    max_sessions: usize,
}

impl PushPool {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            tasks: JoinSet::new(),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Collect finished sessions. Returns how many were collected.
    pub fn reap(&mut self) -> usize {
        let mut reaped = 0;
        while let Some(res) = self.tasks.try_join_next() {
            if let Err(e) = res {
                if e.is_panic() {
                    error!(error = %e, "push session panicked");
                }
            }
            reaped += 1;
        }
        if reaped > 0 {
            debug!(reaped, active = self.tasks.len(), "push sessions reaped");
        }
        reaped
    }

    pub fn active(&self) -> usize {
        self.tasks.len()
    }

    pub fn has_capacity(&mut self) -> bool {
        self.reap();
        self.tasks.len() < self.max_sessions
    }

    pub fn spawn<F>(&mut self, session: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(session);
    }

    /// Wait up to `grace` for every session to exit (they watch the shutdown
    /// token), then abort whatever is left.
    pub async fn drain(mut self, grace: Duration) -> DrainReport {
        let mut report = DrainReport::default();

        let joined = &mut report.joined;
        let finished = tokio::time::timeout(grace, async {
            while self.tasks.join_next().await.is_some() {
                *joined += 1;
            }
        })
        .await
        .is_ok();

        if !finished {
            warn!(left = self.tasks.len(), "push sessions did not stop within grace; aborting");
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {
                report.aborted += 1;
            }
        }
        report
    }
}
