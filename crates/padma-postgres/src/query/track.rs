//! Tracks repository for managing recorded audio sessions.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewTrack, Track};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for track database operations.
pub trait TrackRepository {
    /// Creates a new track record.
    fn create_track(&mut self, new_track: NewTrack) -> impl Future<Output = PgResult<Track>> + Send;

    /// Lists all tracks of a retreat, ordered by track number.
    fn list_tracks(&mut self, retreat_id: Uuid)
    -> impl Future<Output = PgResult<Vec<Track>>> + Send;

    /// Deletes all tracks of a retreat, returning the number removed.
    fn delete_tracks_for_retreat(
        &mut self,
        retreat_id: Uuid,
    ) -> impl Future<Output = PgResult<u64>> + Send;
}

impl TrackRepository for PgConnection {
    async fn create_track(&mut self, new_track: NewTrack) -> PgResult<Track> {
        use schema::tracks;

        let track = diesel::insert_into(tracks::table)
            .values(&new_track)
            .returning(Track::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(track)
    }

    async fn list_tracks(&mut self, retreat_id: Uuid) -> PgResult<Vec<Track>> {
        use schema::tracks::{self, dsl};

        let tracks = tracks::table
            .filter(dsl::retreat_id.eq(retreat_id))
            .order(dsl::track_number.asc())
            .select(Track::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(tracks)
    }

    async fn delete_tracks_for_retreat(&mut self, retreat_id: Uuid) -> PgResult<u64> {
        use schema::tracks::{self, dsl};

        let deleted = diesel::delete(tracks::table.filter(dsl::retreat_id.eq(retreat_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted as u64)
    }
}
