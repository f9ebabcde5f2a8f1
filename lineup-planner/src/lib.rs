//! lineup-planner library
//!
//! Stage/assignment data access, the per-event lineup planner with its
//! drag-and-drop protocol, and the HTTP surface over both.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use lineup_common::events::EventBus;

pub mod api;
pub mod planner;
pub mod store;

use planner::PlannerSessions;
use store::{LineupStore, SqliteLineupStore};

/// Broadcast buffer per SSE subscriber
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Direct store access for the data access endpoints
    pub store: Arc<dyn LineupStore>,
    /// One planner per event
    pub sessions: Arc<PlannerSessions>,
    /// Lineup notifications, forwarded over SSE
    pub event_bus: EventBus,
}

impl AppState {
    /// State over an SQLite pool
    pub fn new(db: SqlitePool) -> Self {
        Self::with_store(Arc::new(SqliteLineupStore::new(db)))
    }

    /// State over any store implementation
    pub fn with_store(store: Arc<dyn LineupStore>) -> Self {
        let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
        let sessions = Arc::new(PlannerSessions::new(Arc::clone(&store), event_bus.clone()));
        Self { store, sessions, event_bus }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, patch, post, put};

    let data_access = Router::new()
        .route(
            "/api/events/:event_id/stages",
            get(api::stages::list_stages).post(api::stages::create_stage),
        )
        .route(
            "/api/events/:event_id/assignments",
            get(api::assignments::list_assignments).post(api::assignments::create_assignment),
        )
        .route(
            "/api/assignments/:assignment_id",
            patch(api::assignments::update_assignment).delete(api::assignments::delete_assignment),
        )
        .route("/api/artists/:artist_id/schedule", get(api::assignments::artist_schedule));

    let lineup = Router::new()
        .route(
            "/api/events/:event_id/lineup",
            get(api::lineup::get_lineup).delete(api::lineup::close),
        )
        .route("/api/events/:event_id/lineup/drag", post(api::lineup::drag))
        .route("/api/events/:event_id/lineup/stages", post(api::lineup::add_stage))
        .route(
            "/api/events/:event_id/lineup/stages/:stage_id/assignments/:assignment_id",
            delete(api::lineup::remove_assignment),
        )
        .route(
            "/api/events/:event_id/lineup/assignments/:assignment_id/schedule",
            put(api::lineup::schedule_assignment),
        )
        .route("/api/events/:event_id/lineup/reload", post(api::lineup::reload))
        .route("/api/events/:event_id/lineup/conflicts", get(api::lineup::conflicts));

    let public = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/events/stream", get(api::event_stream))
        .merge(api::health_routes());

    Router::new()
        .merge(data_access)
        .merge(lineup)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
