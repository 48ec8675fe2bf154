// ── Relationship identity types ──
//
// EntityId and RelationshipKey identify one togglable relationship across
// the cache, the bus and the client. Songs are addressed numerically by
// most backends; artists and albums sometimes by slug.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use melodex_api::RelationshipKind;

// ── EntityId ────────────────────────────────────────────────────────

/// Identifier of a catalog entity: numeric or textual depending on kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Numeric(u64),
    Text(String),
}

impl EntityId {
    pub fn as_numeric(&self) -> Option<u64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Numeric(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self::Numeric(n)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        // Only canonical digit strings are numeric; "007" stays text.
        match s.parse::<u64>() {
            Ok(n) if n.to_string() == s => Self::Numeric(n),
            _ => Self::Text(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

// ── RelationshipKey ─────────────────────────────────────────────────

/// One togglable relationship instance: (kind, entity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationshipKey {
    pub kind: RelationshipKind,
    pub id: EntityId,
}

impl RelationshipKey {
    pub fn new(kind: RelationshipKind, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Favorite-music relationship for a song.
    pub fn favorite(id: impl Into<EntityId>) -> Self {
        Self::new(RelationshipKind::Favorite, id)
    }

    /// Follow-artist relationship.
    pub fn follow(id: impl Into<EntityId>) -> Self {
        Self::new(RelationshipKind::Follow, id)
    }

    /// Like-album relationship.
    pub fn like(id: impl Into<EntityId>) -> Self {
        Self::new(RelationshipKind::Like, id)
    }
}

impl fmt::Display for RelationshipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
