//! Drag gesture payloads and the drop decision
//!
//! A gesture names the dragged item, the list it left and the list it was
//! dropped on. Payloads are decoded once at the HTTP boundary into these
//! types; `decide` then picks exactly one action without touching any state.
//!
//! Decision order:
//! 1. No destination: ignored
//! 2. Same list and same index: ignored
//! 3. Destination is the available-artists list: ignored (drop disabled)
//! 4. Source is the available-artists list: assign
//! 5. Different stages: move
//! 6. Same stage: reorder

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lineup_common::db::Assignment;

/// Droppable id of the roster list
pub const AVAILABLE_LIST_ID: &str = "available-artists";

/// A list a drag can start from or end on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ListId {
    /// The available-artists list (drag source only)
    Available,
    /// One stage lane, identified by the stage id
    Stage(Uuid),
}

impl ListId {
    pub fn stage(self) -> Option<Uuid> {
        match self {
            ListId::Stage(id) => Some(id),
            ListId::Available => None,
        }
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListId::Available => f.write_str(AVAILABLE_LIST_ID),
            ListId::Stage(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for ListId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == AVAILABLE_LIST_ID {
            return Ok(ListId::Available);
        }
        Uuid::parse_str(s)
            .map(ListId::Stage)
            .map_err(|_| format!("Unknown list id '{}'", s))
    }
}

impl TryFrom<String> for ListId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ListId> for String {
    fn from(value: ListId) -> Self {
        value.to_string()
    }
}

/// What is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DragItem {
    /// An artist card from the roster
    AvailableArtist { artist_id: Uuid },
    /// An existing assignment card from a stage lane
    Assignment { assignment_id: Uuid },
}

/// Position in a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragLocation {
    pub list: ListId,
    pub index: usize,
}

/// One completed drag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragGesture {
    pub item: DragItem,
    pub source: DragLocation,
    /// Absent when dropped outside any list
    #[serde(default)]
    pub destination: Option<DragLocation>,
}

/// Why a gesture changed nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    DroppedOutside,
    Unchanged,
    DropDisabled,
    /// Dragged artist or assignment is not where the gesture says
    NotFound,
}

/// Action selected for a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAction {
    Ignore(IgnoreReason),
    Assign {
        artist_id: Uuid,
        stage_id: Uuid,
    },
    Move {
        assignment_id: Uuid,
        from_stage: Uuid,
        from_index: usize,
        to_stage: Uuid,
        to_index: usize,
    },
    Reorder {
        assignment_id: Uuid,
        stage_id: Uuid,
        from_index: usize,
        to_index: usize,
    },
}

/// Result of applying a gesture to a planner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DragOutcome {
    Assigned {
        assignment: Assignment,
    },
    Moved {
        assignment: Assignment,
        from_stage: Uuid,
        to_stage: Uuid,
    },
    Reordered {
        stage_id: Uuid,
    },
    Ignored {
        reason: IgnoreReason,
    },
}

impl DragOutcome {
    pub fn ignored(reason: IgnoreReason) -> Self {
        DragOutcome::Ignored { reason }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, DragOutcome::Ignored { .. })
    }
}

/// Pick the action for a gesture
pub fn decide(gesture: &DragGesture) -> DragAction {
    let Some(destination) = gesture.destination else {
        return DragAction::Ignore(IgnoreReason::DroppedOutside);
    };
    let source = gesture.source;

    if source.list == destination.list && source.index == destination.index {
        return DragAction::Ignore(IgnoreReason::Unchanged);
    }

    let to_stage = match destination.list {
        ListId::Available => return DragAction::Ignore(IgnoreReason::DropDisabled),
        ListId::Stage(id) => id,
    };

    match (source.list, gesture.item) {
        (ListId::Available, DragItem::AvailableArtist { artist_id }) => DragAction::Assign {
            artist_id,
            stage_id: to_stage,
        },
        (ListId::Stage(from_stage), DragItem::Assignment { assignment_id }) => {
            if from_stage != to_stage {
                DragAction::Move {
                    assignment_id,
                    from_stage,
                    from_index: source.index,
                    to_stage,
                    to_index: destination.index,
                }
            } else {
                DragAction::Reorder {
                    assignment_id,
                    stage_id: to_stage,
                    from_index: source.index,
                    to_index: destination.index,
                }
            }
        }
        // Item kind does not match the list it claims to come from
        _ => DragAction::Ignore(IgnoreReason::NotFound),
    }
}
