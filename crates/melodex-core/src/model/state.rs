// ── Controller-facing state ──
//
// What an attached control renders, what it tells the user, and what a
// single toggle request came to.

use serde::Serialize;
use strum::Display;

use super::event::ToggleAction;
use super::key::RelationshipKey;
use crate::error::CoreError;

/// State machine of one toggle controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ControllerState {
    /// Attach-time (or refresh-time) status check in progress.
    CheckingStatus,
    /// Status known; toggling allowed.
    Ready { status: bool },
    /// Mutation in flight; `target` is the optimistic value on display.
    Toggling { target: bool },
    /// Status check failed; toggling disabled until a retry succeeds.
    Error { message: String },
    /// No session. Renders "off" and never touches the network.
    SignedOut,
}

impl ControllerState {
    /// The boolean a control should render for this state.
    pub fn displayed_status(&self) -> bool {
        match self {
            Self::Ready { status } => *status,
            Self::Toggling { target } => *target,
            Self::CheckingStatus | Self::Error { .. } | Self::SignedOut => false,
        }
    }

    /// `true` once no check or mutation is outstanding.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::CheckingStatus | Self::Toggling { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Short label for logs and terminal output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CheckingStatus => "checking",
            Self::Ready { .. } => "ready",
            Self::Toggling { .. } => "toggling",
            Self::Error { .. } => "error",
            Self::SignedOut => "signed-out",
        }
    }
}

/// Dismissible, per-controller message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Success {
        key: RelationshipKey,
        action: ToggleAction,
    },
    /// The backend already held the requested state.
    AlreadySettled { key: RelationshipKey, status: bool },
    SignInRequired { key: RelationshipKey },
    Failed {
        key: RelationshipKey,
        message: String,
        retryable: bool,
    },
}

impl Notification {
    pub fn key(&self) -> &RelationshipKey {
        match self {
            Self::Success { key, .. }
            | Self::AlreadySettled { key, .. }
            | Self::SignInRequired { key }
            | Self::Failed { key, .. } => key,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::SignInRequired { .. })
    }
}

/// Why a toggle request was dropped without a network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IgnoreReason {
    /// A mutation is already in flight.
    Busy,
    /// Status unknown (checking or errored).
    NotReady,
    SignedOut,
}

/// What one toggle request came to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Committed { status: bool },
    AlreadySettled { status: bool },
    RolledBack { status: bool, error: CoreError },
    Ignored(IgnoreReason),
}

impl ToggleOutcome {
    /// Status on display once the request resolved, if it ran at all.
    pub fn status(&self) -> Option<bool> {
        match self {
            Self::Committed { status }
            | Self::AlreadySettled { status }
            | Self::RolledBack { status, .. } => Some(*status),
            Self::Ignored(_) => None,
        }
    }

    /// `true` when the backend ended up in the requested state.
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Committed { .. } | Self::AlreadySettled { .. })
    }
}
