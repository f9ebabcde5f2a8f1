//! Assignment data access endpoints
//!
//! These bypass planner sessions: an open session for the same event only
//! sees the change after a reload. The target stage must belong to the
//! assignment's event, and time windows are overlap-checked against the
//! event's stored assignments before the store is written.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use lineup_common::db::{Assignment, ScheduleEntry};

use super::error::ApiResult;
use crate::planner::schedule::{self, ProposedSet};
use crate::store::{AssignmentPatch, LineupStore, NewAssignment};
use crate::AppState;

/// Reject stages that are unknown or belong to another event
async fn ensure_event_stage(store: &dyn LineupStore, event_id: Uuid, stage_id: Uuid) -> ApiResult<()> {
    let stages = store.list_stages(event_id).await?;
    if stages.iter().any(|s| s.id == stage_id) {
        Ok(())
    } else {
        Err(lineup_common::Error::InvalidInput(format!(
            "Stage {} does not belong to event {}",
            stage_id, event_id
        ))
        .into())
    }
}

/// Optional stage filter for assignment listings
#[derive(Debug, Default, Deserialize)]
pub struct AssignmentQuery {
    pub stage: Option<Uuid>,
}

/// Assignment creation body; the event comes from the path
#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    pub artist_id: Uuid,
    pub stage_id: Uuid,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

/// GET /api/events/:event_id/assignments?stage=<id>
pub async fn list_assignments(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<AssignmentQuery>,
) -> ApiResult<Json<Vec<Assignment>>> {
    Ok(Json(state.store.list_assignments(event_id, query.stage).await?))
}

/// POST /api/events/:event_id/assignments
pub async fn create_assignment(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<CreateAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<Assignment>)> {
    ensure_event_stage(state.store.as_ref(), event_id, request.stage_id).await?;

    let proposed = ProposedSet {
        assignment_id: None,
        artist_id: request.artist_id,
        stage_id: Some(request.stage_id),
        start: request.start,
        end: request.end,
    };
    let existing = state.store.list_assignments(event_id, None).await?;
    schedule::check_proposed(&proposed, &existing)?;

    let assignment = state
        .store
        .create_assignment(NewAssignment {
            artist_id: request.artist_id,
            event_id,
            stage_id: request.stage_id,
            start: request.start,
            end: request.end,
        })
        .await?;

    info!(
        "Assigned artist {} to stage {} (assignment {})",
        assignment.artist, request.stage_id, assignment.id
    );
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// PATCH /api/assignments/:assignment_id
///
/// Absent keys are left alone; an explicit `null` clears a time bound.
pub async fn update_assignment(
    State(state): State<AppState>,
    Path(assignment_id): Path<Uuid>,
    Json(patch): Json<AssignmentPatch>,
) -> ApiResult<Json<Assignment>> {
    let current = state.store.get_assignment(assignment_id).await?;
    if let Some(stage_id) = patch.stage {
        ensure_event_stage(state.store.as_ref(), current.event, stage_id).await?;
    }

    let proposed = ProposedSet {
        stage_id: patch.stage.or(current.stage),
        start: patch.start.unwrap_or(current.start),
        end: patch.end.unwrap_or(current.end),
        ..ProposedSet::from_assignment(&current)
    };
    let existing = state.store.list_assignments(current.event, None).await?;
    schedule::check_proposed(&proposed, &existing)?;

    let updated = state.store.update_assignment(assignment_id, patch).await?;

    info!("Updated assignment {}", assignment_id);
    Ok(Json(updated))
}

/// DELETE /api/assignments/:assignment_id
pub async fn delete_assignment(
    State(state): State<AppState>,
    Path(assignment_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.remove_assignment(assignment_id).await?;

    info!("Removed assignment {}", assignment_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/artists/:artist_id/schedule
pub async fn artist_schedule(
    State(state): State<AppState>,
    Path(artist_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ScheduleEntry>>> {
    Ok(Json(state.store.artist_schedule(artist_id).await?))
}
