//! Stage/assignment data access
//!
//! `LineupStore` is the port through which the planner reaches the entity
//! store. Every call is a single request/response: no caching, no retries,
//! no idempotency keys. Store failures surface as `lineup_common::Error`
//! carrying the store's own message.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use lineup_common::db::{ArtistSummary, Assignment, Event, ScheduleEntry, Stage};
use lineup_common::Result;

mod sqlite;

pub use sqlite::SqliteLineupStore;

/// Stage creation input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStage {
    pub event_id: Uuid,
    pub name: String,
    /// Overrides the event's venue when set
    pub venue_id: Option<Uuid>,
}

/// Assignment creation input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAssignment {
    pub artist_id: Uuid,
    pub event_id: Uuid,
    pub stage_id: Uuid,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Partial assignment update
///
/// `None` leaves a field unchanged. For the nullable time bounds,
/// `Some(None)` clears the value; in JSON that is an explicit `null`,
/// while an absent key leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Uuid>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub start: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub end: Option<Option<DateTime<Utc>>>,
}

impl AssignmentPatch {
    /// Patch that only changes the stage (cross-stage move)
    pub fn move_to(stage: Uuid) -> Self {
        Self { stage: Some(stage), ..Self::default() }
    }

    /// Patch that sets both time bounds
    pub fn window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { stage: None, start: Some(start), end: Some(end) }
    }

    pub fn is_empty(&self) -> bool {
        self.stage.is_none() && self.start.is_none() && self.end.is_none()
    }
}

/// Maps a present key (even `null`) to `Some`
fn present<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Entity store port for stages and assignments
#[async_trait]
pub trait LineupStore: Send + Sync {
    /// Event by id; `Error::NotFound` if absent
    async fn get_event(&self, event_id: Uuid) -> Result<Event>;

    /// Stages of an event in insertion order
    async fn list_stages(&self, event_id: Uuid) -> Result<Vec<Stage>>;

    /// Insert a stage; falls back to the event's venue when none is given
    async fn create_stage(&self, stage: NewStage) -> Result<Stage>;

    /// Assignments of an event (optionally one stage) with the nested artist
    /// projection, ordered by start time (unscheduled first)
    async fn list_assignments(
        &self,
        event_id: Uuid,
        stage_id: Option<Uuid>,
    ) -> Result<Vec<Assignment>>;

    /// Assignment by id with its artist projection; `Error::NotFound` if absent
    async fn get_assignment(&self, assignment_id: Uuid) -> Result<Assignment>;

    /// Plain insert; no overlap or duplicate check
    async fn create_assignment(&self, assignment: NewAssignment) -> Result<Assignment>;

    /// Partial update; `Error::NotFound` if no row matched
    async fn update_assignment(
        &self,
        assignment_id: Uuid,
        patch: AssignmentPatch,
    ) -> Result<Assignment>;

    /// Delete; `Error::NotFound` if no row matched
    async fn remove_assignment(&self, assignment_id: Uuid) -> Result<()>;

    /// Artist roster, by name
    async fn list_artists(&self) -> Result<Vec<ArtistSummary>>;

    /// One artist's assignments across all events, by start time
    async fn artist_schedule(&self, artist_id: Uuid) -> Result<Vec<ScheduleEntry>>;
}
