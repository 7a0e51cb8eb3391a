//! Retreat participants repository for access checks.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewRetreatParticipant, RetreatParticipant};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for retreat participant database operations.
pub trait RetreatParticipantRepository {
    /// Adds an account to a retreat.
    fn add_participant(
        &mut self,
        new_participant: NewRetreatParticipant,
    ) -> impl Future<Output = PgResult<RetreatParticipant>> + Send;

    /// Returns whether an account may download a retreat's recordings.
    ///
    /// Access is granted to active participants, and to everyone when the
    /// retreat is public. Unknown retreats yield `false`.
    fn can_access_retreat(
        &mut self,
        account_id: Uuid,
        retreat_id: Uuid,
    ) -> impl Future<Output = PgResult<bool>> + Send;

    /// Removes all participants of a retreat, returning the number removed.
    fn delete_participants_for_retreat(
        &mut self,
        retreat_id: Uuid,
    ) -> impl Future<Output = PgResult<u64>> + Send;
}

impl RetreatParticipantRepository for PgConnection {
    async fn add_participant(
        &mut self,
        new_participant: NewRetreatParticipant,
    ) -> PgResult<RetreatParticipant> {
        use schema::retreat_participants;

        let participant = diesel::insert_into(retreat_participants::table)
            .values(&new_participant)
            .returning(RetreatParticipant::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(participant)
    }

    async fn can_access_retreat(&mut self, account_id: Uuid, retreat_id: Uuid) -> PgResult<bool> {
        use schema::{retreat_participants, retreats};

        let is_public = retreats::table
            .filter(retreats::id.eq(retreat_id))
            .select(retreats::is_public)
            .first::<bool>(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        match is_public {
            None => Ok(false),
            Some(true) => Ok(true),
            Some(false) => {
                let is_member = diesel::select(diesel::dsl::exists(
                    retreat_participants::table
                        .filter(retreat_participants::retreat_id.eq(retreat_id))
                        .filter(retreat_participants::account_id.eq(account_id))
                        .filter(retreat_participants::is_active.eq(true)),
                ))
                .get_result::<bool>(self)
                .await
                .map_err(PgError::from)?;

                Ok(is_member)
            }
        }
    }

    async fn delete_participants_for_retreat(&mut self, retreat_id: Uuid) -> PgResult<u64> {
        use schema::retreat_participants::{self, dsl};

        let deleted =
            diesel::delete(retreat_participants::table.filter(dsl::retreat_id.eq(retreat_id)))
                .execute(self)
                .await
                .map_err(PgError::from)?;

        Ok(deleted as u64)
    }
}
