// ── Legacy message classifier ──
//
// COMPATIBILITY SHIM. Older backends report idempotent failures only as
// human-readable (sometimes localized) text, e.g. `{"success":false,
// "message":"已收藏"}`. This module is the single place that inspects
// message text; it is consulted only when the response carries neither a
// usable HTTP status nor a structured `code`. Delete it once every backend
// sends `code`.

use crate::relationship::Direction;

/// What a legacy failure message turned out to mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LegacyFailure {
    /// The requested end state already holds.
    Settled,
    /// The session is missing or expired.
    SignedOut,
}

const AUTH_MARKERS: &[&str] = &[
    "unauthorized",
    "not logged in",
    "please log in",
    "please login",
    "sign in",
    "token expired",
    "invalid token",
    "请登录",
    "未登录",
    "登录已过期",
    "未授权",
];

const ALREADY_MARKERS: &[&str] = &[
    "already",
    "duplicate",
    "exists",
    "已收藏",
    "已关注",
    "已点赞",
    "已喜欢",
    "已存在",
    "重复",
];

const ABSENT_MARKERS: &[&str] = &[
    "not favorited",
    "not followed",
    "not following",
    "not liked",
    "not found",
    "does not exist",
    "doesn't exist",
    "not exist",
    "already removed",
    "already unfollowed",
    "already unliked",
    "未收藏",
    "未关注",
    "未点赞",
    "不存在",
    "已取消",
];

/// Classify a failure message. `direction` is `None` for status checks,
/// which can only fail for auth reasons.
///
/// Returns `None` when the text matches nothing known; the caller then
/// treats the failure as a genuine server error.
pub(crate) fn classify(direction: Option<Direction>, message: &str) -> Option<LegacyFailure> {
    let lower = message.to_lowercase();
    let contains_any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if contains_any(AUTH_MARKERS) {
        return Some(LegacyFailure::SignedOut);
    }

    let settled = match direction {
        // "not exists" names a missing entity, not an existing relationship
        Some(Direction::Add) => contains_any(ALREADY_MARKERS) && !contains_any(ABSENT_MARKERS),
        Some(Direction::Remove) => contains_any(ABSENT_MARKERS),
        None => false,
    };
    settled.then_some(LegacyFailure::Settled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_messages_settle_adds() {
        for msg in ["Song already in favorites", "Duplicate follow", "Like exists", "已收藏", "请勿重复点赞"] {
            assert_eq!(classify(Some(Direction::Add), msg), Some(LegacyFailure::Settled), "{msg}");
        }
    }

    #[test]
    fn absent_messages_settle_removes() {
        for msg in ["Artist not followed", "Favorite does not exist", "未收藏该歌曲", "Record not found"] {
            assert_eq!(classify(Some(Direction::Remove), msg), Some(LegacyFailure::Settled), "{msg}");
        }
    }

    #[test]
    fn markers_do_not_cross_directions() {
        assert_eq!(classify(Some(Direction::Remove), "already liked"), None);
        assert_eq!(classify(Some(Direction::Add), "not followed"), None);
        assert_eq!(classify(Some(Direction::Add), "Music not exists"), None);
        assert_eq!(classify(Some(Direction::Add), "Album does not exist"), None);
    }

    #[test]
    fn auth_phrases_win_over_state_phrases() {
        assert_eq!(
            classify(Some(Direction::Add), "Token expired, please log in again"),
            Some(LegacyFailure::SignedOut)
        );
        assert_eq!(classify(Some(Direction::Remove), "请登录"), Some(LegacyFailure::SignedOut));
    }

    #[test]
    fn status_checks_only_classify_auth() {
        assert_eq!(classify(None, "already liked"), None);
        assert_eq!(classify(None, "Unauthorized"), Some(LegacyFailure::SignedOut));
    }

    #[test]
    fn unknown_text_is_unclassified() {
        assert_eq!(classify(Some(Direction::Add), "database is on fire"), None);
    }
}
