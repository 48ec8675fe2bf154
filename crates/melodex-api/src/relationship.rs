// ── Relationship kinds ──
//
// The three togglable associations between the signed-in user and a
// catalog entity. Each kind owns one family of REST endpoints.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Which relationship a request targets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum RelationshipKind {
    /// Favorite a song.
    #[strum(to_string = "favorite", serialize = "favorite", serialize = "music")]
    Favorite,
    /// Follow an artist.
    #[strum(to_string = "follow", serialize = "follow", serialize = "artist")]
    Follow,
    /// Like an album.
    #[strum(to_string = "like", serialize = "like", serialize = "album")]
    Like,
}

impl RelationshipKind {
    /// Path segment of this kind's endpoint family (`/{segment}/{id}`).
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Favorite => "favorites",
            Self::Follow => "follows",
            Self::Like => "likes",
        }
    }

    /// The kind of catalog entity this relationship points at.
    pub fn entity_noun(self) -> &'static str {
        match self {
            Self::Favorite => "music",
            Self::Follow => "artist",
            Self::Like => "album",
        }
    }
}

/// Direction of a relationship mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `POST /{kind}/{id}`: create the relationship.
    Add,
    /// `DELETE /{kind}/{id}`: remove the relationship.
    Remove,
}

impl Direction {
    /// The direction that moves a relationship to `target`.
    pub fn toward(target: bool) -> Self {
        if target { Self::Add } else { Self::Remove }
    }

    /// The relationship status this direction ends in.
    pub fn target(self) -> bool {
        matches!(self, Self::Add)
    }
}
