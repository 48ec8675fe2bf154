// ── Relationship engine ──
//
// The service object an application creates once at startup. It owns the
// status cache, the event bus, the backend handle and the session, and
// vends toggle controllers. Independent engines share nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::info;

use melodex_api::{RelationshipClient, TransportConfig};

use crate::backend::{ClientBackend, RelationshipBackend};
use crate::bus::EventBus;
use crate::cache::StatusCache;
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::model::{ControllerId, RelationshipKey};
use crate::session::Session;
use crate::toggle::ToggleController;

/// Entry point for consumers. Cheaply cloneable.
#[derive(Clone)]
pub struct RelationshipEngine {
    pub(crate) inner: Arc<EngineInner>,
}

pub(crate) struct EngineInner {
    pub(crate) config: EngineConfig,
    pub(crate) cache: StatusCache,
    pub(crate) bus: EventBus,
    pub(crate) backend: Arc<dyn RelationshipBackend>,
    pub(crate) session: Session,
    pub(crate) cancel: CancellationToken,
    pub(crate) next_controller_id: AtomicU64,
    /// When the last throttled passive refresh ran.
    pub(crate) last_passive_refresh: Mutex<Option<tokio::time::Instant>>,
}

impl RelationshipEngine {
    /// Build an engine that talks to the backend over HTTP.
    pub fn new(config: EngineConfig, session: Session) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            timeout: config.timeout,
        };
        let client = RelationshipClient::new(config.base_url.clone(), &transport)?;
        let backend = ClientBackend::new(client, session.clone());
        info!(base_url = %config.base_url, "relationship engine ready");
        Ok(Self::with_backend(config, session, Arc::new(backend)))
    }

    /// Build an engine around any backend.
    pub fn with_backend(
        config: EngineConfig,
        session: Session,
        backend: Arc<dyn RelationshipBackend>,
    ) -> Self {
        let bus = EventBus::new(config.bus_capacity);
        Self {
            inner: Arc::new(EngineInner {
                config,
                cache: StatusCache::new(),
                bus,
                backend,
                session,
                cancel: CancellationToken::new(),
                next_controller_id: AtomicU64::new(1),
                last_passive_refresh: Mutex::new(None),
            }),
        }
    }

    /// Attach a controller for `key`. Must be called inside a tokio runtime.
    ///
    /// The controller starts `Ready` on a cache hit, `SignedOut` without a
    /// session, and `CheckingStatus` otherwise.
    pub fn attach(&self, key: RelationshipKey) -> ToggleController {
        let id = ControllerId(self.inner.next_controller_id.fetch_add(1, Ordering::Relaxed));
        ToggleController::spawn(Arc::clone(&self.inner), id, key)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &StatusCache {
        &self.inner.cache
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Drop every cached status without notifying controllers.
    pub fn reset(&self) {
        self.inner.cache.clear();
        *self
            .inner
            .last_passive_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Stop every controller's background work. Controllers keep their
    /// last state; in-flight mutations still resolve.
    pub fn shutdown(&self) {
        info!("relationship engine shutting down");
        self.inner.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}
