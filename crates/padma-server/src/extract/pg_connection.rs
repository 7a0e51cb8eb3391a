//! PostgreSQL connection extractor for request handlers.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use derive_more::{Deref, DerefMut};
use padma_postgres::{PgClient, PgConn};

use crate::handler::Error;

/// Extractor that provides a database connection from the pool.
///
/// The extracted [`PgConn`] implements all repository traits, so handlers
/// can run queries without touching the pool themselves. Pool exhaustion
/// surfaces as a 503 before the handler body runs.
#[derive(Debug, Deref, DerefMut)]
pub struct PgPool(pub PgConn);

impl<S> FromRequestParts<S> for PgPool
where
    PgClient: FromRef<S>,
    S: Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pg_client = PgClient::from_ref(state);
        let conn = pg_client.get_connection().await?;

        Ok(PgPool(conn))
    }
}

impl aide::OperationInput for PgPool {}
