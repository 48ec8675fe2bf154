// Wire types for the relationship endpoints.

use serde::Deserialize;

/// Response envelope shared by every relationship endpoint.
///
/// `GET /{kind}/{id}/status` carries the boolean in `data`; mutations carry
/// only `success` and a human-readable `message`. Newer backends also send a
/// machine-readable `code` on failure.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Structured failure codes understood at the client boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureCode {
    AlreadyExists,
    NotExists,
    Unauthorized,
}

impl FailureCode {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ALREADY_EXISTS" | "ALREADY_IN_STATE" | "DUPLICATE" => Some(Self::AlreadyExists),
            "NOT_FOUND" | "NOT_EXISTS" | "NOT_IN_STATE" => Some(Self::NotExists),
            "UNAUTHORIZED" | "AUTH_REQUIRED" | "TOKEN_EXPIRED" => Some(Self::Unauthorized),
            _ => None,
        }
    }
}
