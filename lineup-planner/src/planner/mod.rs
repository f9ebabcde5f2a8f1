//! Lineup planner state and the drag-and-drop protocol
//!
//! A `LineupPlanner` mirrors one event's stages and per-stage lanes of
//! assignments, plus the artist roster the available pool is derived from.
//! Every mutation goes to the store first; the local mirror is only touched
//! after the store confirms, so a failed call leaves the planner exactly as
//! it was. Lane order within a stage is display-only and never persisted.

pub mod error;
pub mod gesture;
pub mod schedule;
mod session;


use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use lineup_common::db::{ArtistSummary, Assignment, Event, Stage};
use lineup_common::events::{EventBus, LineupEvent};
use lineup_common::time;

use crate::store::{AssignmentPatch, LineupStore, NewAssignment, NewStage};

pub use error::{Operation, PlannerError, Result};
pub use gesture::{DragAction, DragGesture, DragItem, DragLocation, DragOutcome, IgnoreReason, ListId};
pub use schedule::{ProposedSet, SchedulingConflict};
pub use session::{PlannerSessions, SharedPlanner};

/// One stage with its lane, as shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageLane {
    pub stage: Stage,
    pub assignments: Vec<Assignment>,
}

/// Snapshot of a planner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupView {
    pub event: Event,
    pub stages: Vec<StageLane>,
    /// Roster minus every artist already in a lane
    pub available: Vec<ArtistSummary>,
    /// Lane entries without a start time
    pub unscheduled: Vec<Assignment>,
}

/// In-memory mirror of one event's lineup
#[derive(Debug)]
pub struct LineupPlanner {
    event: Event,
    stages: Vec<Stage>,
    lanes: HashMap<Uuid, Vec<Assignment>>,
    roster: Vec<ArtistSummary>,
    event_bus: EventBus,
}

/// Log a failed mutation, notify subscribers and wrap the store error
fn report_failure(
    event_bus: &EventBus,
    event_id: Uuid,
    operation: Operation,
    source: lineup_common::Error,
) -> PlannerError {
    error!("{} for event {}: {}", operation, event_id, source);
    event_bus.emit_lossy(LineupEvent::OperationFailed {
        event_id,
        operation: operation.label().to_string(),
        message: source.to_string(),
        timestamp: time::now(),
    });
    PlannerError::store(operation, source)
}

/// Group assignments into one lane per stage, keeping listing order
fn build_lanes(stages: &[Stage], assignments: Vec<Assignment>) -> HashMap<Uuid, Vec<Assignment>> {
    let mut lanes: HashMap<Uuid, Vec<Assignment>> =
        stages.iter().map(|s| (s.id, Vec::new())).collect();

    for assignment in assignments {
        match assignment.stage.and_then(|stage| lanes.get_mut(&stage)) {
            Some(lane) => lane.push(assignment),
            None => debug!("Assignment {} has no stage lane, skipping", assignment.id),
        }
    }

    lanes
}

impl LineupPlanner {
    /// Fetch the event, its stages, the roster and all assignments
    pub async fn load(
        store: &dyn LineupStore,
        event_id: Uuid,
        event_bus: EventBus,
    ) -> Result<Self> {
        let fetched = async {
            let event = store.get_event(event_id).await?;
            let stages = store.list_stages(event_id).await?;
            let roster = store.list_artists().await?;
            let assignments = store.list_assignments(event_id, None).await?;
            Ok::<_, lineup_common::Error>((event, stages, roster, assignments))
        }
        .await;

        let (event, stages, roster, assignments) = fetched
            .map_err(|e| report_failure(&event_bus, event_id, Operation::LoadLineup, e))?;

        let lanes = build_lanes(&stages, assignments);
        info!(
            "Loaded lineup for event {} ({} stages, {} artists on roster)",
            event_id,
            stages.len(),
            roster.len()
        );

        Ok(Self { event, stages, lanes, roster, event_bus })
    }

    /// Re-fetch stages and assignments, discarding local lane order
    pub async fn reload(&mut self, store: &dyn LineupStore) -> Result<()> {
        let event_id = self.event.id;
        let fetched = async {
            let stages = store.list_stages(event_id).await?;
            let assignments = store.list_assignments(event_id, None).await?;
            Ok::<_, lineup_common::Error>((stages, assignments))
        }
        .await;

        let (stages, assignments) = fetched
            .map_err(|e| report_failure(&self.event_bus, event_id, Operation::LoadLineup, e))?;

        self.lanes = build_lanes(&stages, assignments);
        self.stages = stages;

        info!("Reloaded lineup for event {}", event_id);
        self.event_bus.emit_lossy(LineupEvent::LineupReloaded {
            event_id,
            timestamp: time::now(),
        });

        Ok(())
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Lane of a stage in display order
    pub fn lane(&self, stage_id: Uuid) -> Option<&[Assignment]> {
        self.lanes.get(&stage_id).map(Vec::as_slice)
    }

    fn all_assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.stages
            .iter()
            .filter_map(|s| self.lanes.get(&s.id))
            .flatten()
    }

    fn find_assignment(&self, assignment_id: Uuid) -> Option<&Assignment> {
        self.all_assignments().find(|a| a.id == assignment_id)
    }

    /// Roster minus any artist holding an assignment in any lane
    pub fn available_pool(&self) -> Vec<ArtistSummary> {
        self.roster
            .iter()
            .filter(|artist| !self.all_assignments().any(|a| a.artist == artist.id))
            .cloned()
            .collect()
    }

    pub fn view(&self) -> LineupView {
        let stages = self
            .stages
            .iter()
            .map(|stage| StageLane {
                stage: stage.clone(),
                assignments: self.lanes.get(&stage.id).cloned().unwrap_or_default(),
            })
            .collect();

        LineupView {
            event: self.event.clone(),
            stages,
            available: self.available_pool(),
            unscheduled: self
                .all_assignments()
                .filter(|a| a.start.is_none())
                .cloned()
                .collect(),
        }
    }

    /// Create a stage and append it with an empty lane
    ///
    /// Blank names are rejected before the store is called. Without an
    /// explicit venue the store falls back to the event's venue.
    pub async fn add_stage(
        &mut self,
        store: &dyn LineupStore,
        name: &str,
        venue_id: Option<Uuid>,
    ) -> Result<Stage> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlannerError::Validation("Stage name cannot be empty".to_string()));
        }

        let stage = store
            .create_stage(NewStage {
                event_id: self.event.id,
                name: name.to_string(),
                venue_id,
            })
            .await
            .map_err(|e| self.fail(Operation::CreateStage, e))?;

        info!("Created stage '{}' ({}) for event {}", stage.name, stage.id, self.event.id);
        self.event_bus.emit_lossy(LineupEvent::StageCreated {
            event_id: self.event.id,
            stage_id: stage.id,
            name: stage.name.clone(),
            timestamp: time::now(),
        });

        self.lanes.insert(stage.id, Vec::new());
        self.stages.push(stage.clone());

        Ok(stage)
    }

    /// Apply one drag gesture
    pub async fn handle_drag(
        &mut self,
        store: &dyn LineupStore,
        gesture: &DragGesture,
    ) -> Result<DragOutcome> {
        match gesture::decide(gesture) {
            DragAction::Ignore(reason) => {
                debug!("Ignoring drag on event {}: {:?}", self.event.id, reason);
                Ok(DragOutcome::ignored(reason))
            }
            DragAction::Assign { artist_id, stage_id } => {
                self.assign(store, artist_id, stage_id).await
            }
            DragAction::Move { assignment_id, from_stage, from_index, to_stage, to_index } => {
                self.move_between(store, assignment_id, (from_stage, from_index), (to_stage, to_index))
                    .await
            }
            DragAction::Reorder { assignment_id, stage_id, from_index, to_index } => {
                Ok(self.reorder(assignment_id, stage_id, from_index, to_index))
            }
        }
    }

    async fn assign(
        &mut self,
        store: &dyn LineupStore,
        artist_id: Uuid,
        stage_id: Uuid,
    ) -> Result<DragOutcome> {
        if !self.lanes.contains_key(&stage_id) {
            warn!("Drop on unknown stage {} ignored", stage_id);
            return Ok(DragOutcome::ignored(IgnoreReason::NotFound));
        }
        if !self.available_pool().iter().any(|a| a.id == artist_id) {
            debug!("Artist {} is not in the available pool", artist_id);
            return Ok(DragOutcome::ignored(IgnoreReason::NotFound));
        }

        let assignment = store
            .create_assignment(NewAssignment {
                artist_id,
                event_id: self.event.id,
                stage_id,
                start: None,
                end: None,
            })
            .await
            .map_err(|e| self.fail(Operation::AssignArtist, e))?;

        info!(
            "Assigned '{}' to stage {} (assignment {})",
            assignment.artist_info.name, stage_id, assignment.id
        );
        self.event_bus.emit_lossy(LineupEvent::ArtistAssigned {
            event_id: self.event.id,
            assignment_id: assignment.id,
            artist_id,
            stage_id,
            timestamp: time::now(),
        });

        if let Some(lane) = self.lanes.get_mut(&stage_id) {
            lane.push(assignment.clone());
        }

        Ok(DragOutcome::Assigned { assignment })
    }

    /// Position of an assignment in a lane: the gesture's index when it
    /// matches, otherwise wherever the id is found
    fn locate(&self, stage_id: Uuid, assignment_id: Uuid, hint: usize) -> Option<usize> {
        let lane = self.lanes.get(&stage_id)?;
        match lane.get(hint) {
            Some(a) if a.id == assignment_id => Some(hint),
            _ => lane.iter().position(|a| a.id == assignment_id),
        }
    }

    async fn move_between(
        &mut self,
        store: &dyn LineupStore,
        assignment_id: Uuid,
        (from_stage, from_index): (Uuid, usize),
        (to_stage, to_index): (Uuid, usize),
    ) -> Result<DragOutcome> {
        let Some(position) = self.locate(from_stage, assignment_id, from_index) else {
            debug!("Assignment {} not in lane {}", assignment_id, from_stage);
            return Ok(DragOutcome::ignored(IgnoreReason::NotFound));
        };
        if !self.lanes.contains_key(&to_stage) {
            warn!("Drop on unknown stage {} ignored", to_stage);
            return Ok(DragOutcome::ignored(IgnoreReason::NotFound));
        }

        // A scheduled set must still fit on its new stage
        if let Some(current) = self.lanes.get(&from_stage).and_then(|lane| lane.get(position)) {
            let proposed = ProposedSet {
                stage_id: Some(to_stage),
                ..ProposedSet::from_assignment(current)
            };
            schedule::check_proposed(&proposed, self.all_assignments())?;
        }

        let updated = store
            .update_assignment(assignment_id, AssignmentPatch::move_to(to_stage))
            .await
            .map_err(|e| self.fail(Operation::MoveArtist, e))?;

        if let Some(lane) = self.lanes.get_mut(&from_stage) {
            lane.remove(position);
        }
        if let Some(lane) = self.lanes.get_mut(&to_stage) {
            let index = to_index.min(lane.len());
            lane.insert(index, updated.clone());
        }

        info!(
            "Moved '{}' from stage {} to stage {}",
            updated.artist_info.name, from_stage, to_stage
        );
        self.event_bus.emit_lossy(LineupEvent::AssignmentMoved {
            event_id: self.event.id,
            assignment_id,
            from_stage,
            to_stage,
            timestamp: time::now(),
        });

        Ok(DragOutcome::Moved { assignment: updated, from_stage, to_stage })
    }

    /// Local splice; nothing is sent to the store
    fn reorder(
        &mut self,
        assignment_id: Uuid,
        stage_id: Uuid,
        from_index: usize,
        to_index: usize,
    ) -> DragOutcome {
        let Some(position) = self.locate(stage_id, assignment_id, from_index) else {
            debug!("Assignment {} not in lane {}", assignment_id, stage_id);
            return DragOutcome::ignored(IgnoreReason::NotFound);
        };
        let Some(lane) = self.lanes.get_mut(&stage_id) else {
            return DragOutcome::ignored(IgnoreReason::NotFound);
        };

        let moved = lane.remove(position);
        let index = to_index.min(lane.len());
        lane.insert(index, moved);

        debug!("Reordered lane {} ({} -> {})", stage_id, position, index);
        self.event_bus.emit_lossy(LineupEvent::LineupReordered {
            event_id: self.event.id,
            stage_id,
            timestamp: time::now(),
        });

        DragOutcome::Reordered { stage_id }
    }

    /// Delete an assignment and drop it from its lane
    ///
    /// The assignment must sit in the lane of `stage_id`; anything else,
    /// including another event's assignment, is not found and the store
    /// is left untouched.
    pub async fn remove_assignment(
        &mut self,
        store: &dyn LineupStore,
        stage_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<()> {
        let Some(position) = self
            .lanes
            .get(&stage_id)
            .and_then(|lane| lane.iter().position(|a| a.id == assignment_id))
        else {
            return Err(self.fail(
                Operation::RemoveArtist,
                lineup_common::Error::NotFound(format!(
                    "Assignment {} is not on stage {}",
                    assignment_id, stage_id
                )),
            ));
        };

        store
            .remove_assignment(assignment_id)
            .await
            .map_err(|e| self.fail(Operation::RemoveArtist, e))?;

        if let Some(lane) = self.lanes.get_mut(&stage_id) {
            lane.remove(position);
        }

        info!("Removed assignment {} from stage {}", assignment_id, stage_id);
        self.event_bus.emit_lossy(LineupEvent::AssignmentRemoved {
            event_id: self.event.id,
            assignment_id,
            timestamp: time::now(),
        });

        Ok(())
    }

    /// Set (or clear) the time window of an assignment
    ///
    /// The window is validated against every other set in the planner
    /// before the store is called.
    pub async fn schedule_assignment(
        &mut self,
        store: &dyn LineupStore,
        assignment_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Assignment> {
        let Some(current) = self.find_assignment(assignment_id) else {
            return Err(self.fail(
                Operation::ScheduleArtist,
                lineup_common::Error::NotFound(format!("Assignment {} is not on this lineup", assignment_id)),
            ));
        };

        let proposed = ProposedSet { start, end, ..ProposedSet::from_assignment(current) };
        schedule::check_proposed(&proposed, self.all_assignments())?;

        let updated = store
            .update_assignment(assignment_id, AssignmentPatch::window(start, end))
            .await
            .map_err(|e| self.fail(Operation::ScheduleArtist, e))?;

        for lane in self.lanes.values_mut() {
            if let Some(slot) = lane.iter_mut().find(|a| a.id == assignment_id) {
                *slot = updated.clone();
            }
        }

        info!("Scheduled assignment {} ({:?} - {:?})", assignment_id, start, end);
        self.event_bus.emit_lossy(LineupEvent::AssignmentScheduled {
            event_id: self.event.id,
            assignment_id,
            start,
            end,
            timestamp: time::now(),
        });

        Ok(updated)
    }

    /// Overlapping sets per stage
    pub fn conflicts(&self) -> Vec<SchedulingConflict> {
        schedule::conflict_report(&self.stages, self.all_assignments())
    }

    fn fail(&self, operation: Operation, source: lineup_common::Error) -> PlannerError {
        report_failure(&self.event_bus, self.event.id, operation, source)
    }
}
