// ── Reconciliation task ──
//
// After a committed toggle or an adopted sibling event, a controller
// re-reads the backend a bounded number of times to catch lagging or
// conflicting writes. At most one task runs per controller; scheduling
// while one is pending restarts its attempt budget.

use std::sync::{Arc, PoisonError};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tracing::{debug, info, trace};

use super::ControllerShared;
use crate::model::ControllerState;

/// Handle on a controller's pending reconciliation task.
#[derive(Default)]
pub(super) struct ReconcileTask {
    restart: Notify,
    requested: AtomicBool,
}

enum Verdict {
    /// Backend agrees with the display.
    Converged,
    /// Final attempt disagreed; backend value adopted.
    Adopted,
    /// Backend disagrees (or the check failed); try again later.
    Pending,
    /// Controller is not `Ready`; nothing to compare.
    Skipped,
}

impl ControllerShared {
    pub(super) fn schedule_reconcile(self: &Arc<Self>) {
        let policy = self.engine.config.reconcile;
        if !policy.is_enabled() || self.cancel.is_cancelled() {
            return;
        }

        let mut slot = self.reconcile.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(signal) = slot.as_ref() {
            signal.requested.store(true, Ordering::Release);
            signal.restart.notify_one();
            trace!(controller = %self.id, key = %self.key, "reconcile restarted");
            return;
        }

        let signal = Arc::new(ReconcileTask::default());
        *slot = Some(Arc::clone(&signal));
        drop(slot);

        trace!(controller = %self.id, key = %self.key, "reconcile scheduled");
        tokio::spawn(run(Arc::clone(self), signal));
    }

    /// One attempt: refetch through the cache and compare with what is
    /// displayed at this moment.
    async fn verify(&self, final_attempt: bool) -> Verdict {
        if self.ready_status().is_none() {
            return Verdict::Skipped;
        }

        let backend = &self.engine.backend;
        let remote = match self
            .engine
            .cache
            .refetch(&self.key, || backend.check(&self.key))
            .await
        {
            Ok(status) => status,
            Err(err) => {
                debug!(controller = %self.id, key = %self.key, error = %err, "reconcile check failed");
                return Verdict::Pending;
            }
        };

        let Some(displayed) = self.ready_status() else {
            return Verdict::Skipped;
        };
        if remote == displayed {
            return Verdict::Converged;
        }
        if !final_attempt {
            debug!(controller = %self.id, key = %self.key, remote, displayed, "backend disagrees; will recheck");
            return Verdict::Pending;
        }

        self.state.send_if_modified(|state| {
            if !state.is_ready() {
                return false;
            }
            *state = ControllerState::Ready { status: remote };
            true
        });
        self.engine.cache.set(&self.key, remote);
        self.publish(remote);
        info!(controller = %self.id, key = %self.key, status = remote, "adopted backend status");
        Verdict::Adopted
    }
}

async fn run(shared: Arc<ControllerShared>, signal: Arc<ReconcileTask>) {
    let policy = shared.engine.config.reconcile;

    'run: loop {
        let mut attempt = 0;
        while attempt < policy.max_attempts {
            tokio::select! {
                biased;
                () = shared.cancel.cancelled() => return,
                () = signal.restart.notified() => {
                    signal.requested.store(false, Ordering::Release);
                    attempt = 0;
                    continue;
                }
                () = tokio::time::sleep(policy.delay_for(attempt)) => {}
            }

            let final_attempt = attempt + 1 == policy.max_attempts;
            match shared.verify(final_attempt).await {
                Verdict::Converged | Verdict::Adopted | Verdict::Skipped => break,
                Verdict::Pending => attempt += 1,
            }
        }

        let restart = {
            let mut slot = shared.reconcile.lock().unwrap_or_else(PoisonError::into_inner);
            let restart = signal.requested.swap(false, Ordering::AcqRel);
            if !restart {
                *slot = None;
            }
            restart
        };
        if restart {
            continue 'run;
        }
        trace!(controller = %shared.id, key = %shared.key, attempts = attempt, "reconcile finished");
        return;
    }
}
