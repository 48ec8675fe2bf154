// ── Backend seam ──
//
// The engine reaches the network only through `RelationshipBackend`.
// `ClientBackend` binds the HTTP client to the session; tests substitute
// an in-memory implementation.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::debug;

use melodex_api::{Direction, RelationshipClient};

use crate::error::CoreError;
use crate::model::RelationshipKey;
use crate::session::Session;

/// Check and mutate relationships on the backend.
///
/// Returned futures are `'static` so the cache and controllers can run
/// them on their own tasks.
pub trait RelationshipBackend: Send + Sync + 'static {
    /// Whether the relationship currently holds.
    fn check(&self, key: &RelationshipKey) -> BoxFuture<'static, Result<bool, CoreError>>;

    /// Move the relationship in `direction`. Issues exactly one request.
    fn mutate(
        &self,
        key: &RelationshipKey,
        direction: Direction,
    ) -> BoxFuture<'static, Result<(), CoreError>>;
}

/// `RelationshipBackend` over the HTTP client.
///
/// Without a session token every call fails with `AuthRequired` and
/// nothing is sent.
#[derive(Clone)]
pub struct ClientBackend {
    client: RelationshipClient,
    session: Session,
}

impl ClientBackend {
    pub fn new(client: RelationshipClient, session: Session) -> Self {
        Self { client, session }
    }

    pub fn client(&self) -> &RelationshipClient {
        &self.client
    }
}

impl RelationshipBackend for ClientBackend {
    fn check(&self, key: &RelationshipKey) -> BoxFuture<'static, Result<bool, CoreError>> {
        let client = self.client.clone();
        let token = self.session.token();
        let key = key.clone();
        async move {
            let Some(token) = token else {
                debug!(key = %key, "check skipped: signed out");
                return Err(CoreError::signed_out());
            };
            let id = key.id.to_string();
            Ok(client.check(key.kind, &id, &token).await?)
        }
        .boxed()
    }

    fn mutate(
        &self,
        key: &RelationshipKey,
        direction: Direction,
    ) -> BoxFuture<'static, Result<(), CoreError>> {
        let client = self.client.clone();
        let token = self.session.token();
        let key = key.clone();
        async move {
            let Some(token) = token else {
                debug!(key = %key, ?direction, "mutation skipped: signed out");
                return Err(CoreError::signed_out());
            };
            let id = key.id.to_string();
            Ok(client.mutate(direction, key.kind, &id, &token).await?)
        }
        .boxed()
    }
}
