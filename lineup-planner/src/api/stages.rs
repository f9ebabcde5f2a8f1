//! Stage data access endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use lineup_common::db::Stage;

use super::error::{ApiError, ApiResult};
use crate::store::NewStage;
use crate::AppState;

/// Stage creation body
#[derive(Debug, Deserialize)]
pub struct CreateStageRequest {
    pub name: String,
    #[serde(default)]
    pub venue_id: Option<Uuid>,
}

/// GET /api/events/:event_id/stages
pub async fn list_stages(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Stage>>> {
    Ok(Json(state.store.list_stages(event_id).await?))
}

/// POST /api/events/:event_id/stages
pub async fn create_stage(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<CreateStageRequest>,
) -> ApiResult<(StatusCode, Json<Stage>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Stage name cannot be empty".to_string()));
    }

    let stage = state
        .store
        .create_stage(NewStage {
            event_id,
            name: name.to_string(),
            venue_id: request.venue_id,
        })
        .await?;

    info!("Created stage '{}' ({}) for event {}", stage.name, stage.id, event_id);
    Ok((StatusCode::CREATED, Json(stage)))
}
