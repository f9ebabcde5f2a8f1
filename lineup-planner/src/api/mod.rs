//! HTTP API handlers for lineup-planner

pub mod assignments;
pub mod buildinfo;
pub mod error;
pub mod health;
pub mod lineup;
pub mod sse;
pub mod stages;

pub use buildinfo::get_build_info;
pub use error::{ApiError, ApiResult};
pub use health::health_routes;
pub use sse::event_stream;
