//! Relationship-state synchronization between `melodex-api` and UI consumers.
//!
//! Tracks whether the signed-in user has favorited a song, followed an
//! artist or liked an album, and keeps that boolean consistent across any
//! number of independently attached controls:
//!
//! - **[`RelationshipEngine`]**: the service object. Owns one
//!   [`StatusCache`], one [`EventBus`], the backend and the [`Session`];
//!   vends controllers via [`attach()`](RelationshipEngine::attach) and
//!   exposes the passive refresh triggers (`on_focus`,
//!   `on_visibility_change`, `force_refresh_all`, `clear_kind`).
//!
//! - **[`StatusCache`]**: last-known status per [`RelationshipKey`] with
//!   deduplicated fetches. Entries never expire; only explicit signals
//!   invalidate them.
//!
//! - **[`EventBus`]**: in-process broadcast of [`BusEvent`]s so sibling
//!   controllers converge without their own network calls.
//!
//! - **[`ToggleController`]**: one per attached control. Publishes its
//!   [`ControllerState`] on a watch channel, applies optimistic toggles,
//!   rolls back on failure, treats "already in that state" as success and
//!   runs a bounded reconciliation task after each change.
//!
//! - **[`RelationshipBackend`]**: the seam to the network.
//!   [`ClientBackend`] binds the HTTP client to the session.

pub mod backend;
pub mod bus;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
mod refresh;
pub mod session;
pub mod stream;
pub mod toggle;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{ClientBackend, RelationshipBackend};
pub use bus::{BusSubscription, Delivery, EventBus};
pub use cache::StatusCache;
pub use config::{EngineConfig, ReconcilePolicy};
pub use engine::RelationshipEngine;
pub use error::CoreError;
pub use session::Session;
pub use stream::StateStream;
pub use toggle::ToggleController;

pub use model::{
    BusEvent, ControllerId, ControllerState, EntityId, IgnoreReason, Notification,
    RelationshipKey, ToggleAction, ToggleEvent, ToggleOutcome,
};

// Kinds and directions live in the API crate; re-export for consumers.
pub use melodex_api::{Direction, RelationshipKind, TlsMode};
