//! Retreat participant model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::retreat_participants;

/// Membership record linking an account to a retreat.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = retreat_participants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RetreatParticipant {
    /// Reference to the retreat.
    pub retreat_id: Uuid,
    /// Participating account.
    pub account_id: Uuid,
    /// Whether the membership is currently active.
    pub is_active: bool,
    /// When the account joined the retreat.
    pub joined_at: Timestamp,
}

/// Data for creating a new retreat participant.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = retreat_participants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRetreatParticipant {
    /// Retreat ID (required).
    pub retreat_id: Uuid,
    /// Account ID (required).
    pub account_id: Uuid,
    /// Whether the membership starts active.
    pub is_active: Option<bool>,
}
