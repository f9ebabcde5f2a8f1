//! Database models
//!
//! Shapes of the rows the lineup subsystem reads and writes. Timestamps are
//! UTC and serialize as RFC 3339 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single occurrence; read-only for the lineup subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Default venue for stages created without one
    pub venue: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub capacity: Option<i64>,
}

/// Named performance area scoped to one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: Uuid,
    pub event: Uuid,
    pub name: String,
    pub venue: Option<Uuid>,
}

/// Minimal artist projection (id, name, avatar)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar: Option<String>,
}

/// Artist-to-stage link for one event, with an optional time window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub artist: Uuid,
    pub event: Uuid,
    /// Nullable in the schema; every assignment made by the planner has one
    pub stage: Option<Uuid>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Nested artist projection
    pub artist_info: ArtistSummary,
}

/// One row of an artist's schedule across events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub assignment_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub stage_id: Option<Uuid>,
    pub stage_name: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}
