//! Planner sessions
//!
//! One planner per event, loaded lazily on first use. Each planner sits
//! behind its own mutex that is held across the store call, so gestures for
//! one event are applied one at a time while different events proceed
//! concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use lineup_common::events::EventBus;

use super::{LineupPlanner, Result};
use crate::store::LineupStore;

/// Shared handle to one event's planner
pub type SharedPlanner = Arc<Mutex<LineupPlanner>>;

pub struct PlannerSessions {
    store: Arc<dyn LineupStore>,
    event_bus: EventBus,
    sessions: RwLock<HashMap<Uuid, SharedPlanner>>,
}

impl PlannerSessions {
    pub fn new(store: Arc<dyn LineupStore>, event_bus: EventBus) -> Self {
        Self {
            store,
            event_bus,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &dyn LineupStore {
        self.store.as_ref()
    }

    /// Planner for an event, loading it from the store if needed
    pub async fn get_or_load(&self, event_id: Uuid) -> Result<SharedPlanner> {
        if let Some(planner) = self.sessions.read().await.get(&event_id) {
            return Ok(Arc::clone(planner));
        }

        let planner =
            LineupPlanner::load(self.store.as_ref(), event_id, self.event_bus.clone()).await?;

        // Another request may have loaded the same event meanwhile; keep the first
        let mut sessions = self.sessions.write().await;
        let shared = Arc::clone(
            sessions
                .entry(event_id)
                .or_insert_with(|| Arc::new(Mutex::new(planner))),
        );
        debug!("Planner session open for event {} ({} total)", event_id, sessions.len());

        Ok(shared)
    }

    /// Re-fetch an event's planner from the store
    pub async fn reload(&self, event_id: Uuid) -> Result<SharedPlanner> {
        let existing = self.sessions.read().await.get(&event_id).cloned();

        match existing {
            Some(planner) => {
                planner.lock().await.reload(self.store.as_ref()).await?;
                Ok(planner)
            }
            None => self.get_or_load(event_id).await,
        }
    }

    /// Drop an event's planner; returns false if none was open
    pub async fn close(&self, event_id: Uuid) -> bool {
        let closed = self.sessions.write().await.remove(&event_id).is_some();
        if closed {
            info!("Closed planner session for event {}", event_id);
        }
        closed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
