//! # Lineup Common Library
//!
//! Shared code for the lineup services including:
//! - Database bootstrap and row models
//! - Event types (LineupEvent enum) and the EventBus
//! - Configuration loading and root folder resolution
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
