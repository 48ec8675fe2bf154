// ── Bus messages ──

use std::fmt;

use serde::Serialize;
use strum::Display;

use melodex_api::RelationshipKind;

use super::key::RelationshipKey;

/// Identity of one attached toggle controller, unique per engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ControllerId(pub(crate) u64);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a status change did, in the vocabulary of its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToggleAction {
    Added,
    Removed,
    Followed,
    Unfollowed,
}

impl ToggleAction {
    /// The action that leaves `kind` in `status`.
    pub fn for_status(kind: RelationshipKind, status: bool) -> Self {
        match (kind, status) {
            (RelationshipKind::Follow, true) => Self::Followed,
            (RelationshipKind::Follow, false) => Self::Unfollowed,
            (_, true) => Self::Added,
            (_, false) => Self::Removed,
        }
    }
}

/// A relationship status change, published on the bus.
///
/// Never persisted or replayed: subscribers that attach later get current
/// truth from their own attach-time fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleEvent {
    pub key: RelationshipKey,
    pub action: ToggleAction,
    pub new_status: bool,
    /// Controller that published the event; `None` for engine-level publishers.
    pub origin: Option<ControllerId>,
}

impl ToggleEvent {
    pub fn new(key: RelationshipKey, new_status: bool, origin: Option<ControllerId>) -> Self {
        let action = ToggleAction::for_status(key.kind, new_status);
        Self {
            key,
            action,
            new_status,
            origin,
        }
    }
}

/// Everything that travels over the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "topic", rename_all = "snake_case")]
pub enum BusEvent {
    /// One relationship changed (optimistically, confirmed, or corrected).
    StatusChanged(ToggleEvent),
    /// Every cached status of `kind` was dropped; recheck.
    AllCleared { kind: RelationshipKind },
    /// Every cached status was dropped; recheck everything.
    ForceRefreshAll,
}
