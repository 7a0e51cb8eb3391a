//! Database models for all entities in the system.
//!
//! This module contains Diesel model definitions for all database tables,
//! including structs for querying, inserting, and updating records.

mod download_request;
mod retreat;
mod retreat_participant;
mod track;

pub use download_request::{DownloadRequest, NewDownloadRequest, UpdateDownloadRequest};
pub use retreat::{NewRetreat, Retreat, UpdateRetreat};
pub use retreat_participant::{NewRetreatParticipant, RetreatParticipant};
pub use track::{NewTrack, Track, UpdateTrack};
