//! Retreats repository for managing recorded teaching events.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewRetreat, Retreat};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for retreat database operations.
pub trait RetreatRepository {
    /// Creates a new retreat record.
    fn create_retreat(
        &mut self,
        new_retreat: NewRetreat,
    ) -> impl Future<Output = PgResult<Retreat>> + Send;

    /// Finds a retreat by its unique identifier.
    fn find_retreat(
        &mut self,
        retreat_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Retreat>>> + Send;

    /// Deletes a retreat record.
    ///
    /// Dependent rows must be removed first; foreign keys restrict deletion
    /// while download requests or tracks still reference the retreat.
    fn delete_retreat(&mut self, retreat_id: Uuid) -> impl Future<Output = PgResult<()>> + Send;
}

impl RetreatRepository for PgConnection {
    async fn create_retreat(&mut self, new_retreat: NewRetreat) -> PgResult<Retreat> {
        use schema::retreats;

        let retreat = diesel::insert_into(retreats::table)
            .values(&new_retreat)
            .returning(Retreat::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(retreat)
    }

    async fn find_retreat(&mut self, retreat_id: Uuid) -> PgResult<Option<Retreat>> {
        use schema::retreats::{self, dsl};

        let retreat = retreats::table
            .filter(dsl::id.eq(retreat_id))
            .select(Retreat::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(retreat)
    }

    async fn delete_retreat(&mut self, retreat_id: Uuid) -> PgResult<()> {
        use schema::retreats::{self, dsl};

        diesel::delete(retreats::table.filter(dsl::id.eq(retreat_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }
}
