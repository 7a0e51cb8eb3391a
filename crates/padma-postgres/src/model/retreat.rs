//! Retreat model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::{Date, Timestamp};
use uuid::Uuid;

use crate::schema::retreats;

/// Retreat model representing a recorded teaching event.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = retreats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Retreat {
    /// Unique retreat identifier.
    pub id: Uuid,
    /// Human-readable retreat name.
    pub display_name: String,
    /// First day of the retreat.
    pub starts_on: Date,
    /// Last day of the retreat.
    pub ends_on: Date,
    /// Whether recordings are accessible without participation.
    pub is_public: bool,
    /// When the retreat was created.
    pub created_at: Timestamp,
    /// When the retreat was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new retreat.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = retreats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRetreat {
    /// Human-readable retreat name (required).
    pub display_name: String,
    /// First day of the retreat (required).
    pub starts_on: Date,
    /// Last day of the retreat (required).
    pub ends_on: Date,
    /// Whether recordings are accessible without participation.
    pub is_public: Option<bool>,
}

/// Data for updating a retreat.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = retreats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateRetreat {
    /// Human-readable retreat name.
    pub display_name: Option<String>,
    /// First day of the retreat.
    pub starts_on: Option<Date>,
    /// Last day of the retreat.
    pub ends_on: Option<Date>,
    /// Whether recordings are accessible without participation.
    pub is_public: Option<bool>,
}

impl Retreat {
    /// Returns the duration of the retreat in days, inclusive of both ends.
    pub fn duration_days(&self) -> i32 {
        let starts: jiff::civil::Date = self.starts_on.into();
        let ends: jiff::civil::Date = self.ends_on.into();
        (ends - starts).get_days() + 1
    }
}
