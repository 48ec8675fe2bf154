// ── Passive refresh triggers ──
//
// Signals that out-of-band changes may have happened (another tab, another
// device, a different user). Each one invalidates cached statuses and
// tells controllers to recheck.

use std::sync::PoisonError;

use secrecy::SecretString;
use tracing::{debug, info};

use melodex_api::RelationshipKind;

use crate::engine::RelationshipEngine;
use crate::model::BusEvent;

impl RelationshipEngine {
    /// The application window gained focus.
    ///
    /// Bursts within `focus_debounce` collapse into one refresh. Returns
    /// `true` if this call refreshed.
    pub fn on_focus(&self) -> bool {
        self.passive_refresh("focus")
    }

    /// The page became visible or hidden. Hiding does nothing.
    pub fn on_visibility_change(&self, visible: bool) -> bool {
        visible && self.passive_refresh("visibility")
    }

    /// Invalidate everything and make every controller recheck, unthrottled.
    pub fn force_refresh_all(&self) {
        info!("forcing refresh of all relationship statuses");
        self.inner.cache.invalidate_all(None);
        self.inner.bus.publish(BusEvent::ForceRefreshAll);
    }

    /// Invalidate every status of `kind`; controllers of that kind recheck.
    pub fn clear_kind(&self, kind: RelationshipKind) {
        debug!(%kind, "clearing relationship kind");
        self.inner.cache.invalidate_all(Some(kind));
        self.inner.bus.publish(BusEvent::AllCleared { kind });
    }

    /// Store a new session token and recheck everything under it.
    pub fn sign_in(&self, token: SecretString) {
        self.inner.session.set_token(token);
        info!("signed in");
        self.force_refresh_all();
    }

    /// Drop the session token; every controller falls back to signed out.
    pub fn sign_out(&self) {
        self.inner.session.clear();
        info!("signed out");
        self.force_refresh_all();
    }

    fn passive_refresh(&self, trigger: &'static str) -> bool {
        let now = tokio::time::Instant::now();
        let debounce = self.inner.config.focus_debounce;
        {
            let mut last = self
                .inner
                .last_passive_refresh
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if last.is_some_and(|at| now.duration_since(at) < debounce) {
                debug!(trigger, "passive refresh throttled");
                return false;
            }
            *last = Some(now);
        }
        debug!(trigger, "passive refresh");
        self.force_refresh_all();
        true
    }
}
