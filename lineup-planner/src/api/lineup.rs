//! Lineup planner endpoints
//!
//! Each request locks the event's planner session for its whole duration,
//! store call included.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use lineup_common::db::{Assignment, Stage};

use super::error::{ApiError, ApiResult};
use crate::planner::{DragGesture, DragOutcome, LineupView, SchedulingConflict};
use crate::AppState;

/// Stage creation body for the planner
#[derive(Debug, Deserialize)]
pub struct AddStageRequest {
    pub name: String,
    #[serde(default)]
    pub venue_id: Option<Uuid>,
}

/// Time window body; a missing bound means "unset"
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

/// Outcome of a drag plus the planner state after it
#[derive(Debug, Serialize)]
pub struct DragResponse {
    pub outcome: DragOutcome,
    pub lineup: LineupView,
}

/// GET /api/events/:event_id/lineup
pub async fn get_lineup(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<LineupView>> {
    let planner = state.sessions.get_or_load(event_id).await?;
    let view = planner.lock().await.view();
    Ok(Json(view))
}

/// POST /api/events/:event_id/lineup/drag
///
/// Malformed gestures (unknown list id, unknown item kind) are rejected
/// with 400 before the planner sees them.
pub async fn drag(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<DragResponse>> {
    let gesture: DragGesture = serde_json::from_value(payload)
        .map_err(|e| ApiError::BadRequest(format!("Invalid drag gesture: {}", e)))?;

    let planner = state.sessions.get_or_load(event_id).await?;
    let mut planner = planner.lock().await;
    let outcome = planner.handle_drag(state.sessions.store(), &gesture).await?;

    Ok(Json(DragResponse { outcome, lineup: planner.view() }))
}

/// POST /api/events/:event_id/lineup/stages
pub async fn add_stage(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<AddStageRequest>,
) -> ApiResult<(StatusCode, Json<Stage>)> {
    let planner = state.sessions.get_or_load(event_id).await?;
    let stage = planner
        .lock()
        .await
        .add_stage(state.sessions.store(), &request.name, request.venue_id)
        .await?;

    Ok((StatusCode::CREATED, Json(stage)))
}

/// DELETE /api/events/:event_id/lineup/stages/:stage_id/assignments/:assignment_id
pub async fn remove_assignment(
    State(state): State<AppState>,
    Path((event_id, stage_id, assignment_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let planner = state.sessions.get_or_load(event_id).await?;
    planner
        .lock()
        .await
        .remove_assignment(state.sessions.store(), stage_id, assignment_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/events/:event_id/lineup/assignments/:assignment_id/schedule
pub async fn schedule_assignment(
    State(state): State<AppState>,
    Path((event_id, assignment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ScheduleRequest>,
) -> ApiResult<Json<Assignment>> {
    let planner = state.sessions.get_or_load(event_id).await?;
    let updated = planner
        .lock()
        .await
        .schedule_assignment(state.sessions.store(), assignment_id, request.start, request.end)
        .await?;

    Ok(Json(updated))
}

/// POST /api/events/:event_id/lineup/reload
pub async fn reload(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<LineupView>> {
    let planner = state.sessions.reload(event_id).await?;
    let view = planner.lock().await.view();
    Ok(Json(view))
}

/// GET /api/events/:event_id/lineup/conflicts
pub async fn conflicts(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Vec<SchedulingConflict>>> {
    let planner = state.sessions.get_or_load(event_id).await?;
    let report = planner.lock().await.conflicts();
    Ok(Json(report))
}

/// DELETE /api/events/:event_id/lineup
pub async fn close(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.sessions.close(event_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("No open lineup for event {}", event_id)))
    }
}
