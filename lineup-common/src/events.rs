//! Lineup event types
//!
//! Provides the LineupEvent enum and the EventBus every planner session
//! publishes to. The SSE endpoint forwards these events to connected clients
//! as transient notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Lineup event types
///
/// Serialized with a `type` tag so SSE clients can dispatch on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LineupEvent {
    /// Stage added to an event
    StageCreated {
        event_id: Uuid,
        stage_id: Uuid,
        name: String,
        timestamp: DateTime<Utc>,
    },

    /// Artist dropped from the available pool onto a stage
    ArtistAssigned {
        event_id: Uuid,
        assignment_id: Uuid,
        artist_id: Uuid,
        stage_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Assignment dragged from one stage to another
    AssignmentMoved {
        event_id: Uuid,
        assignment_id: Uuid,
        from_stage: Uuid,
        to_stage: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Display order within a stage changed (not persisted)
    LineupReordered {
        event_id: Uuid,
        stage_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Assignment deleted
    AssignmentRemoved {
        event_id: Uuid,
        assignment_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Time window of an assignment changed
    AssignmentScheduled {
        event_id: Uuid,
        assignment_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        timestamp: DateTime<Utc>,
    },

    /// Planner state re-fetched from the store
    LineupReloaded {
        event_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A mutation failed; `operation` is the user-facing label
    /// ("Failed to move artist") and `message` the store's message
    OperationFailed {
        event_id: Uuid,
        operation: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl LineupEvent {
    /// Variant name, used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            LineupEvent::StageCreated { .. } => "StageCreated",
            LineupEvent::ArtistAssigned { .. } => "ArtistAssigned",
            LineupEvent::AssignmentMoved { .. } => "AssignmentMoved",
            LineupEvent::LineupReordered { .. } => "LineupReordered",
            LineupEvent::AssignmentRemoved { .. } => "AssignmentRemoved",
            LineupEvent::AssignmentScheduled { .. } => "AssignmentScheduled",
            LineupEvent::LineupReloaded { .. } => "LineupReloaded",
            LineupEvent::OperationFailed { .. } => "OperationFailed",
        }
    }

    /// Event (the music event, not the bus event) this notification concerns
    pub fn event_id(&self) -> Uuid {
        match self {
            LineupEvent::StageCreated { event_id, .. }
            | LineupEvent::ArtistAssigned { event_id, .. }
            | LineupEvent::AssignmentMoved { event_id, .. }
            | LineupEvent::LineupReordered { event_id, .. }
            | LineupEvent::AssignmentRemoved { event_id, .. }
            | LineupEvent::AssignmentScheduled { event_id, .. }
            | LineupEvent::LineupReloaded { event_id, .. }
            | LineupEvent::OperationFailed { event_id, .. } => *event_id,
        }
    }
}

/// Central distribution bus for lineup events
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use lineup_common::events::{EventBus, LineupEvent};
/// use uuid::Uuid;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(LineupEvent::LineupReloaded {
///     event_id: Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LineupEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LineupEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: LineupEvent,
    ) -> Result<usize, broadcast::error::SendError<LineupEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: LineupEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_is_tagged() {
        let event_id = Uuid::new_v4();
        let event = LineupEvent::OperationFailed {
            event_id,
            operation: "Failed to move artist".to_string(),
            message: "Database error: disk I/O error".to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "OperationFailed");
        assert_eq!(json["operation"], "Failed to move artist");
        assert_eq!(json["event_id"], event_id.to_string());
        assert_eq!(event.event_type(), "OperationFailed");
        assert_eq!(event.event_id(), event_id);
    }

    #[test]
    fn test_emit_without_subscribers_is_error() {
        let bus = EventBus::new(10);
        let event = LineupEvent::LineupReloaded {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        };

        assert!(bus.emit(event.clone()).is_err());
        // Lossy emission never fails
        bus.emit_lossy(event);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.capacity(), 10);
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let event_id = Uuid::new_v4();
        let stage_id = Uuid::new_v4();

        bus.emit(LineupEvent::LineupReordered { event_id, stage_id, timestamp: Utc::now() })
            .unwrap();
        bus.emit(LineupEvent::LineupReloaded { event_id, timestamp: Utc::now() })
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().event_type(), "LineupReordered");
        assert_eq!(rx.recv().await.unwrap().event_type(), "LineupReloaded");
    }
}
