//! Track model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::tracks;

/// Track model representing a single recorded audio session.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = tracks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Track {
    /// Unique track identifier.
    pub id: Uuid,
    /// Reference to the retreat.
    pub retreat_id: Uuid,
    /// Session title.
    pub title: String,
    /// Position within the retreat, starting at one.
    pub track_number: i32,
    /// Object storage key of the audio file.
    pub audio_key: String,
    /// Audio file size in bytes, if known.
    pub file_size: Option<i64>,
    /// When the track was created.
    pub created_at: Timestamp,
}

/// Data for creating a new track.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tracks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewTrack {
    /// Retreat ID (required).
    pub retreat_id: Uuid,
    /// Session title (required).
    pub title: String,
    /// Position within the retreat (required).
    pub track_number: i32,
    /// Object storage key of the audio file (required).
    pub audio_key: String,
    /// Audio file size in bytes.
    pub file_size: Option<i64>,
}

/// Data for updating a track.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = tracks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateTrack {
    /// Session title.
    pub title: Option<String>,
    /// Object storage key of the audio file.
    pub audio_key: Option<String>,
    /// Audio file size in bytes.
    pub file_size: Option<Option<i64>>,
}
