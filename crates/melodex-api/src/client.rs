// Relationship HTTP client
//
// One kind-polymorphic client for favorites, follows and likes. Every
// public method issues exactly one HTTP request and never retries; retry
// and reconciliation policy belongs to the caller.

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::compat::{self, LegacyFailure};
use crate::error::Error;
use crate::models::{ApiEnvelope, FailureCode};
use crate::relationship::{Direction, RelationshipKind};
use crate::transport::TransportConfig;

/// Async client for the relationship endpoints.
///
/// Endpoints, per kind:
/// - `GET    {base}/{kind}/{id}/status` → `{ success, data: bool }`
/// - `POST   {base}/{kind}/{id}`        → `{ success, message }`
/// - `DELETE {base}/{kind}/{id}`        → `{ success, message }`
#[derive(Clone)]
pub struct RelationshipClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RelationshipClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the API root, e.g. `https://catalog.example.com/api`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl {
                url: base_url.to_string(),
            });
        }
        Ok(Self { http, base_url })
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Relationship operations ──────────────────────────────────────

    /// Ask whether the relationship `kind` currently holds for entity `id`.
    pub async fn check(
        &self,
        kind: RelationshipKind,
        id: &str,
        token: &SecretString,
    ) -> Result<bool, Error> {
        let url = self.relationship_url(kind, id, Some("status"))?;
        debug!("GET {url}");

        let resp = self.authorized(Method::GET, url, token)?.send().await?;
        let envelope: ApiEnvelope<bool> = self.parse_envelope(resp, None).await?;
        match envelope.data {
            Some(status) => Ok(status),
            None => Err(Error::Deserialization {
                message: "status response is missing `data`".into(),
                body: String::new(),
            }),
        }
    }

    /// Create the relationship. Fails with
    /// [`Error::AlreadyInDesiredState`] if it already exists.
    pub async fn add(
        &self,
        kind: RelationshipKind,
        id: &str,
        token: &SecretString,
    ) -> Result<(), Error> {
        self.mutate(Direction::Add, kind, id, token).await
    }

    /// Remove the relationship. Fails with
    /// [`Error::NotInDesiredState`] if it is already absent.
    pub async fn remove(
        &self,
        kind: RelationshipKind,
        id: &str,
        token: &SecretString,
    ) -> Result<(), Error> {
        self.mutate(Direction::Remove, kind, id, token).await
    }

    /// Move the relationship in `direction`.
    pub async fn mutate(
        &self,
        direction: Direction,
        kind: RelationshipKind,
        id: &str,
        token: &SecretString,
    ) -> Result<(), Error> {
        let url = self.relationship_url(kind, id, None)?;
        let method = match direction {
            Direction::Add => Method::POST,
            Direction::Remove => Method::DELETE,
        };
        debug!("{method} {url}");

        let resp = self.authorized(method, url, token)?.send().await?;
        let _: ApiEnvelope<serde_json::Value> = self.parse_envelope(resp, Some(direction)).await?;
        Ok(())
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build `{base}/{kind}/{id}[/{suffix}]`, percent-encoding `id`.
    fn relationship_url(
        &self,
        kind: RelationshipKind,
        id: &str,
        suffix: Option<&str>,
    ) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| Error::InvalidBaseUrl {
                url: self.base_url.to_string(),
            })?;
            segments.pop_if_empty().push(kind.path_segment()).push(id);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn authorized(
        &self,
        method: Method,
        url: Url,
        token: &SecretString,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::AuthRequired {
                message: format!("invalid bearer token: {e}"),
            })?;
        value.set_sensitive(true);
        Ok(self.http.request(method, url).header(AUTHORIZATION, value))
    }

    /// Parse the `{ success, data, message, code }` envelope.
    ///
    /// For mutations, failures are classified in order: HTTP status,
    /// structured `code`, then the legacy message classifier.
    async fn parse_envelope<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        direction: Option<Direction>,
    ) -> Result<ApiEnvelope<T>, Error> {
        let status = resp.status();
        let body = resp.text().await?;
        trace!(%status, body = %preview(&body), "relationship response");

        let envelope = serde_json::from_str::<ApiEnvelope<T>>(&body);

        if status == StatusCode::UNAUTHORIZED {
            let message = envelope
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| "session expired or missing".into());
            return Err(Error::AuthRequired { message });
        }

        if status == StatusCode::CONFLICT && direction == Some(Direction::Add) {
            let message = envelope
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| "relationship already exists".into());
            return Err(Error::AlreadyInDesiredState { message });
        }

        match envelope {
            Ok(env) if status.is_success() && env.success => Ok(env),
            Ok(env) => Err(classify_failure(
                status,
                direction,
                env.code,
                env.message,
            )),
            // 204 No Content from a mutation is a plain success.
            Err(_) if status.is_success() && direction.is_some() && body.trim().is_empty() => {
                Ok(ApiEnvelope {
                    success: true,
                    data: None,
                    message: None,
                    code: None,
                })
            }
            Err(_) if !status.is_success() => Err(Error::Api {
                status: status.as_u16(),
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    preview(&body)
                },
                code: None,
            }),
            Err(e) => Err(Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body,
            }),
        }
    }
}

/// Map a failed envelope onto the error taxonomy.
fn classify_failure(
    status: StatusCode,
    direction: Option<Direction>,
    code: Option<String>,
    message: Option<String>,
) -> Error {
    let message = message.unwrap_or_else(|| status.to_string());

    if let Some(parsed) = code.as_deref().and_then(FailureCode::parse) {
        match (parsed, direction) {
            (FailureCode::Unauthorized, _) => return Error::AuthRequired { message },
            (FailureCode::AlreadyExists, Some(Direction::Add)) => {
                return Error::AlreadyInDesiredState { message };
            }
            (FailureCode::NotExists, Some(Direction::Remove)) => {
                return Error::NotInDesiredState { message };
            }
            _ => {}
        }
    } else if code.is_none() {
        match (compat::classify(direction, &message), direction) {
            (Some(LegacyFailure::SignedOut), _) => return Error::AuthRequired { message },
            (Some(LegacyFailure::Settled), Some(Direction::Add)) => {
                return Error::AlreadyInDesiredState { message };
            }
            (Some(LegacyFailure::Settled), Some(Direction::Remove)) => {
                return Error::NotInDesiredState { message };
            }
            _ => {}
        }
    }

    Error::Api {
        status: status.as_u16(),
        message,
        code,
    }
}

/// First 200 characters of a body, safe on multi-byte text.
fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
