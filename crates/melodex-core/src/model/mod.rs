// ── Domain model ──
//
// Keys, bus messages and controller-facing state shared by every layer of
// the engine.

pub mod event;
pub mod key;
pub mod state;

pub use event::{BusEvent, ControllerId, ToggleAction, ToggleEvent};
pub use key::{EntityId, RelationshipKey};
pub use state::{ControllerState, IgnoreReason, Notification, ToggleOutcome};
