// ── Toggle controller ──
//
// One `ToggleController` per attached control. It owns a small state
// machine published on a `watch` channel, listens to the engine's bus for
// sibling updates and invalidation signals, and runs optimistic toggles.
//
// Background work (bus listener, mutations, reconciliation) runs on
// spawned tasks holding an `Arc<ControllerShared>`. Dropping the handle
// cancels the listener and reconciliation; an in-flight mutation still
// resolves so the cache and siblings end up consistent.

mod reconcile;

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use melodex_api::Direction;

use crate::bus::{BusSubscription, Delivery};
use crate::engine::EngineInner;
use crate::error::CoreError;
use crate::model::{
    BusEvent, ControllerId, ControllerState, IgnoreReason, Notification, RelationshipKey,
    ToggleAction, ToggleEvent, ToggleOutcome,
};
use crate::stream::StateStream;

use self::reconcile::ReconcileTask;

const NOTIFICATION_CAPACITY: usize = 16;

/// Handle for one attached control.
///
/// Created by [`RelationshipEngine::attach`](crate::RelationshipEngine::attach).
/// Dropping it detaches.
pub struct ToggleController {
    shared: Arc<ControllerShared>,
}

pub(crate) struct ControllerShared {
    id: ControllerId,
    key: RelationshipKey,
    engine: Arc<EngineInner>,
    state: watch::Sender<ControllerState>,
    notifications: broadcast::Sender<Notification>,
    reconcile: Mutex<Option<Arc<ReconcileTask>>>,
    cancel: CancellationToken,
}

impl ToggleController {
    pub(crate) fn spawn(engine: Arc<EngineInner>, id: ControllerId, key: RelationshipKey) -> Self {
        let initial = if !engine.session.is_authenticated() {
            ControllerState::SignedOut
        } else if let Some(status) = engine.cache.get(&key) {
            ControllerState::Ready { status }
        } else {
            ControllerState::CheckingStatus
        };
        let needs_check = initial == ControllerState::CheckingStatus;
        debug!(controller = %id, key = %key, state = initial.label(), "controller attached");

        let (state, _) = watch::channel(initial);
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        let cancel = engine.cancel.child_token();
        let subscription = engine.bus.subscribe();

        let shared = Arc::new(ControllerShared {
            id,
            key,
            engine,
            state,
            notifications,
            reconcile: Mutex::new(None),
            cancel,
        });

        tokio::spawn(listen(Arc::clone(&shared), subscription, needs_check));

        Self { shared }
    }

    pub fn id(&self) -> ControllerId {
        self.shared.id
    }

    pub fn key(&self) -> &RelationshipKey {
        &self.shared.key
    }

    /// Current state snapshot.
    pub fn state(&self) -> ControllerState {
        self.shared.state.borrow().clone()
    }

    /// The boolean the control should render right now.
    pub fn status(&self) -> bool {
        self.shared.state.borrow().displayed_status()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.shared.state.subscribe())
    }

    /// Receive notifications raised from now on.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.shared.notifications.subscribe()
    }

    /// Flip the relationship.
    ///
    /// Applies the flip optimistically, then resolves once the backend
    /// answered. Ignored while a previous toggle is in flight, while the
    /// status is unknown, and when signed out.
    pub async fn toggle(&self) -> ToggleOutcome {
        self.request(None).await
    }

    /// Move the relationship to `desired`. Resolves immediately with
    /// `AlreadySettled` if it is already displayed.
    pub async fn set(&self, desired: bool) -> ToggleOutcome {
        self.request(Some(desired)).await
    }

    /// Re-run the status check after an error or sign-in.
    pub async fn retry(&self) -> ControllerState {
        let state = self.state();
        if matches!(state, ControllerState::Error { .. } | ControllerState::SignedOut) {
            self.shared.check().await;
        }
        self.state()
    }

    /// Wait until no check or mutation is outstanding.
    pub async fn wait_settled(&self) -> ControllerState {
        let mut rx = self.shared.state.subscribe();
        match rx.wait_for(ControllerState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// `true` while a reconciliation task is pending.
    pub fn is_reconciling(&self) -> bool {
        self.shared
            .reconcile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop listening and cancel reconciliation.
    pub fn detach(self) {
        drop(self);
    }

    async fn request(&self, desired: Option<bool>) -> ToggleOutcome {
        let shared = &self.shared;
        let previous = match shared.begin_toggle(desired) {
            Ok(Some(previous)) => previous,
            Ok(None) => {
                let status = shared.state.borrow().displayed_status();
                return ToggleOutcome::AlreadySettled { status };
            }
            Err(reason) => {
                debug!(controller = %shared.id, key = %shared.key, %reason, "toggle ignored");
                if reason == IgnoreReason::SignedOut {
                    shared.notify(Notification::SignInRequired {
                        key: shared.key.clone(),
                    });
                }
                return ToggleOutcome::Ignored(reason);
            }
        };

        let task = tokio::spawn(run_toggle(Arc::clone(shared), previous));
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => ToggleOutcome::RolledBack {
                status: previous,
                error: CoreError::Internal(format!("toggle task failed: {e}")),
            },
        }
    }
}

impl Drop for ToggleController {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
        debug!(controller = %self.shared.id, key = %self.shared.key, "controller detached");
    }
}

// ── Bus listener ─────────────────────────────────────────────────────

async fn listen(shared: Arc<ControllerShared>, mut subscription: BusSubscription, check_first: bool) {
    if check_first && shared.cancel.run_until_cancelled(shared.check()).await.is_none() {
        return;
    }

    loop {
        tokio::select! {
            biased;
            () = shared.cancel.cancelled() => break,
            delivery = subscription.recv() => {
                let handled = match delivery {
                    Some(Delivery::Event(event)) => {
                        shared.cancel.run_until_cancelled(shared.on_bus_event(event)).await
                    }
                    Some(Delivery::Lagged(skipped)) => {
                        warn!(
                            controller = %shared.id,
                            key = %shared.key,
                            skipped,
                            "bus subscription lagged; rechecking status"
                        );
                        shared.cancel.run_until_cancelled(shared.refresh()).await
                    }
                    None => None,
                };
                if handled.is_none() {
                    break;
                }
            }
        }
    }
    debug!(controller = %shared.id, "bus listener stopped");
}

// ── Mutation task ────────────────────────────────────────────────────

async fn run_toggle(shared: Arc<ControllerShared>, previous: bool) -> ToggleOutcome {
    let target = !previous;
    let direction = Direction::toward(target);
    let engine = &shared.engine;
    let key = &shared.key;

    engine.cache.set(key, target);
    shared.publish(target);
    debug!(controller = %shared.id, key = %key, ?direction, "optimistic toggle applied");

    match engine.backend.mutate(key, direction).await {
        Ok(()) => {
            engine.cache.set(key, target);
            shared.finish(target);
            shared.publish(target);
            shared.schedule_reconcile();
            info!(controller = %shared.id, key = %key, status = target, "toggle committed");
            shared.notify(Notification::Success {
                key: key.clone(),
                action: ToggleAction::for_status(key.kind, target),
            });
            ToggleOutcome::Committed { status: target }
        }
        Err(err) if err.settles(direction) => {
            debug!(controller = %shared.id, key = %key, error = %err, "backend already settled; rechecking");
            shared.finish(target);
            engine.cache.invalidate(key);

            let backend = Arc::clone(&engine.backend);
            let status = match engine.cache.get_or_fetch(key, || backend.check(key)).await {
                Ok(status) => status,
                Err(e) => {
                    debug!(key = %key, error = %e, "recheck failed; keeping requested status");
                    engine.cache.set(key, target);
                    target
                }
            };

            if status != target {
                shared.adopt(status);
                shared.publish(status);
            }
            shared.notify(Notification::AlreadySettled {
                key: key.clone(),
                status,
            });
            ToggleOutcome::AlreadySettled { status }
        }
        Err(err) => {
            warn!(controller = %shared.id, key = %key, error = %err, "toggle failed; rolling back");
            engine.cache.set(key, previous);
            shared.finish(previous);
            shared.publish(previous);

            let notification = if err.is_auth_required() {
                Notification::SignInRequired { key: key.clone() }
            } else {
                Notification::Failed {
                    key: key.clone(),
                    message: err.to_string(),
                    retryable: err.is_transient(),
                }
            };
            shared.notify(notification);
            ToggleOutcome::RolledBack {
                status: previous,
                error: err,
            }
        }
    }
}

// ── Shared state transitions ─────────────────────────────────────────

impl ControllerShared {
    /// Take the `Toggling` guard atomically.
    ///
    /// `Ok(Some(previous))` when a mutation must run, `Ok(None)` when
    /// `desired` is already displayed.
    fn begin_toggle(&self, desired: Option<bool>) -> Result<Option<bool>, IgnoreReason> {
        if !self.engine.session.is_authenticated() {
            return Err(IgnoreReason::SignedOut);
        }

        let mut result = Err(IgnoreReason::NotReady);
        self.state.send_if_modified(|state| match *state {
            ControllerState::Ready { status } => {
                let target = desired.unwrap_or(!status);
                if target == status {
                    result = Ok(None);
                    return false;
                }
                *state = ControllerState::Toggling { target };
                result = Ok(Some(status));
                true
            }
            ControllerState::Toggling { .. } => {
                result = Err(IgnoreReason::Busy);
                false
            }
            ControllerState::SignedOut => {
                result = Err(IgnoreReason::SignedOut);
                false
            }
            ControllerState::CheckingStatus | ControllerState::Error { .. } => false,
        });
        result
    }

    /// Release the `Toggling` guard.
    fn finish(&self, status: bool) {
        let next = if self.engine.session.is_authenticated() {
            ControllerState::Ready { status }
        } else {
            ControllerState::SignedOut
        };
        self.state.send_replace(next);
    }

    /// Replace a `Ready`/`Error` state with `Ready(status)`. Returns `true`
    /// only if the state changed.
    fn adopt(&self, status: bool) -> bool {
        self.state.send_if_modified(|state| {
            let next = ControllerState::Ready { status };
            if !matches!(state, ControllerState::Ready { .. } | ControllerState::Error { .. })
                || *state == next
            {
                return false;
            }
            *state = next;
            true
        })
    }

    /// Status check through the cache.
    async fn check(&self) {
        if !self.engine.session.is_authenticated() {
            self.state.send_if_modified(|state| {
                if matches!(state, ControllerState::Toggling { .. } | ControllerState::SignedOut) {
                    return false;
                }
                *state = ControllerState::SignedOut;
                true
            });
            return;
        }

        let mut busy = false;
        self.state.send_if_modified(|state| match state {
            ControllerState::Toggling { .. } => {
                busy = true;
                false
            }
            ControllerState::CheckingStatus => false,
            _ => {
                *state = ControllerState::CheckingStatus;
                true
            }
        });
        if busy {
            return;
        }

        let backend = &self.engine.backend;
        let result = self
            .engine
            .cache
            .get_or_fetch(&self.key, || backend.check(&self.key))
            .await;

        let next = match result {
            Ok(status) => ControllerState::Ready { status },
            Err(err) if err.is_auth_required() => {
                debug!(controller = %self.id, key = %self.key, error = %err, "status check needs sign-in");
                self.notify(Notification::SignInRequired {
                    key: self.key.clone(),
                });
                ControllerState::SignedOut
            }
            Err(err) => {
                warn!(controller = %self.id, key = %self.key, error = %err, "status check failed");
                ControllerState::Error {
                    message: err.to_string(),
                }
            }
        };

        self.state.send_if_modified(|state| {
            if *state != ControllerState::CheckingStatus {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Recheck after an invalidation, unless a check or toggle is running.
    async fn refresh(&self) {
        let idle = matches!(
            *self.state.borrow(),
            ControllerState::Ready { .. } | ControllerState::Error { .. } | ControllerState::SignedOut
        );
        if idle {
            self.check().await;
        }
    }

    async fn on_bus_event(self: &Arc<Self>, event: BusEvent) {
        match event {
            BusEvent::StatusChanged(change) => {
                if change.key != self.key || change.origin == Some(self.id) {
                    return;
                }
                if self.adopt(change.new_status) {
                    debug!(
                        controller = %self.id,
                        key = %self.key,
                        status = change.new_status,
                        origin = ?change.origin,
                        "adopted external status change"
                    );
                    self.schedule_reconcile();
                }
            }
            BusEvent::AllCleared { kind } if kind == self.key.kind => self.refresh().await,
            BusEvent::ForceRefreshAll => self.refresh().await,
            BusEvent::AllCleared { .. } => {}
        }
    }

    fn publish(&self, status: bool) {
        self.engine.bus.publish(BusEvent::StatusChanged(ToggleEvent::new(
            self.key.clone(),
            status,
            Some(self.id),
        )));
    }

    fn notify(&self, notification: Notification) {
        // No receivers is fine: notifications are dismissible.
        let _ = self.notifications.send(notification);
    }

    fn ready_status(&self) -> Option<bool> {
        match *self.state.borrow() {
            ControllerState::Ready { status } => Some(status),
            _ => None,
        }
    }
}
