//! Set time windows and overlap detection
//!
//! A window is the half-open interval `[start, end)`: back-to-back sets that
//! touch do not overlap. Only windows with both bounds set take part in
//! overlap checks; a partially scheduled set never conflicts.
//!
//! Two windows clash when they share a stage, or when they belong to the same
//! artist on any stage of the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lineup_common::db::{Assignment, Stage};

use super::error::{PlannerError, Result};

/// Window a set is about to get, checked before the store is called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposedSet {
    /// Excluded from the comparison when rescheduling an existing set
    pub assignment_id: Option<Uuid>,
    pub artist_id: Uuid,
    pub stage_id: Option<Uuid>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ProposedSet {
    /// The set as it would be after moving/rescheduling an existing assignment
    pub fn from_assignment(assignment: &Assignment) -> Self {
        Self {
            assignment_id: Some(assignment.id),
            artist_id: assignment.artist,
            stage_id: assignment.stage,
            start: assignment.start,
            end: assignment.end,
        }
    }
}

/// Fully specified window of an assignment, if it has one
pub fn window_of(assignment: &Assignment) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    Some((assignment.start?, assignment.end?))
}

/// Half-open interval intersection
pub fn overlaps(
    a: (DateTime<Utc>, DateTime<Utc>),
    b: (DateTime<Utc>, DateTime<Utc>),
) -> bool {
    a.0 < b.1 && b.0 < a.1
}

/// End must come after start when both are set
pub fn validate_window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if end <= start => Err(PlannerError::Validation(format!(
            "Set end ({}) must be after set start ({})",
            end.to_rfc3339(),
            start.to_rfc3339()
        ))),
        _ => Ok(()),
    }
}

/// First existing set the proposal would collide with
pub fn find_overlap<'a, I>(proposed: &ProposedSet, existing: I) -> Option<&'a Assignment>
where
    I: IntoIterator<Item = &'a Assignment>,
{
    let window = (proposed.start?, proposed.end?);

    existing.into_iter().find(|other| {
        if Some(other.id) == proposed.assignment_id {
            return false;
        }
        let same_stage = proposed.stage_id.is_some() && other.stage == proposed.stage_id;
        let same_artist = other.artist == proposed.artist_id;
        if !same_stage && !same_artist {
            return false;
        }
        window_of(other).is_some_and(|w| overlaps(window, w))
    })
}

/// Validate the window and reject it if it collides with an existing set
pub fn check_proposed<'a, I>(proposed: &ProposedSet, existing: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Assignment>,
{
    validate_window(proposed.start, proposed.end)?;

    if let Some(other) = find_overlap(proposed, existing) {
        let (start, end) = window_of(other).unwrap_or_default();
        let reason = if other.artist == proposed.artist_id {
            "artist is already performing"
        } else {
            "stage is already booked"
        };
        return Err(PlannerError::Overlap(format!(
            "{}: overlaps '{}' ({} - {})",
            reason,
            other.artist_info.name,
            start.format("%H:%M"),
            end.format("%H:%M")
        )));
    }

    Ok(())
}

/// One performance in a conflict report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictingPerformance {
    pub assignment_id: Uuid,
    pub artist_id: Uuid,
    pub artist_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Other assignments on the same stage this one overlaps
    pub overlaps_with: Vec<Uuid>,
}

/// Overlapping performances of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingConflict {
    pub stage_id: Uuid,
    pub stage_name: String,
    pub conflicting_performances: Vec<ConflictingPerformance>,
}

/// Per-stage report of overlapping sets, in stage order
///
/// Stages without conflicts are left out. Within a stage, performances are
/// listed by start time.
pub fn conflict_report<'a, I>(stages: &[Stage], assignments: I) -> Vec<SchedulingConflict>
where
    I: IntoIterator<Item = &'a Assignment>,
{
    let assignments: Vec<&Assignment> = assignments.into_iter().collect();

    stages
        .iter()
        .filter_map(|stage| {
            let mut scheduled: Vec<(&Assignment, (DateTime<Utc>, DateTime<Utc>))> = assignments
                .iter()
                .filter(|a| a.stage == Some(stage.id))
                .filter_map(|a| window_of(a).map(|w| (*a, w)))
                .collect();
            scheduled.sort_by_key(|(_, w)| *w);

            let conflicting_performances: Vec<ConflictingPerformance> = scheduled
                .iter()
                .filter_map(|(a, w)| {
                    let overlaps_with: Vec<Uuid> = scheduled
                        .iter()
                        .filter(|(b, v)| b.id != a.id && overlaps(*w, *v))
                        .map(|(b, _)| b.id)
                        .collect();
                    if overlaps_with.is_empty() {
                        return None;
                    }
                    Some(ConflictingPerformance {
                        assignment_id: a.id,
                        artist_id: a.artist,
                        artist_name: a.artist_info.name.clone(),
                        start: w.0,
                        end: w.1,
                        overlaps_with,
                    })
                })
                .collect();

            if conflicting_performances.is_empty() {
                None
            } else {
                Some(SchedulingConflict {
                    stage_id: stage.id,
                    stage_name: stage.name.clone(),
                    conflicting_performances,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lineup_common::db::ArtistSummary;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, hour, minute, 0).unwrap()
    }

    fn set(
        artist: Uuid,
        stage: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Assignment {
        Assignment {
            id: Uuid::new_v4(),
            artist,
            event: Uuid::nil(),
            stage: Some(stage),
            start,
            end,
            artist_info: ArtistSummary { id: artist, name: "Someone".into(), avatar: None },
        }
    }

    fn stage(name: &str) -> Stage {
        Stage { id: Uuid::new_v4(), event: Uuid::nil(), name: name.into(), venue: None }
    }

    fn proposal(artist: Uuid, stage: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> ProposedSet {
        ProposedSet {
            assignment_id: None,
            artist_id: artist,
            stage_id: Some(stage),
            start: Some(start),
            end: Some(end),
        }
    }

    #[test]
    fn test_touching_windows_do_not_overlap() {
        assert!(!overlaps((at(20, 0), at(21, 0)), (at(21, 0), at(22, 0))));
        assert!(overlaps((at(20, 0), at(21, 30)), (at(21, 0), at(22, 0))));
        assert!(overlaps((at(20, 0), at(23, 0)), (at(21, 0), at(22, 0))));
    }

    #[test]
    fn test_end_must_follow_start() {
        assert!(validate_window(Some(at(21, 0)), Some(at(21, 0))).is_err());
        assert!(validate_window(Some(at(22, 0)), Some(at(21, 0))).is_err());
        assert!(validate_window(Some(at(21, 0)), None).is_ok());
        assert!(validate_window(None, None).is_ok());
    }

    #[test]
    fn test_same_stage_overlap_rejected() {
        let main = Uuid::new_v4();
        let existing = vec![set(Uuid::new_v4(), main, Some(at(21, 0)), Some(at(22, 0)))];

        let proposed = proposal(Uuid::new_v4(), main, at(21, 30), at(22, 30));
        let err = check_proposed(&proposed, &existing).unwrap_err();

        assert!(matches!(err, PlannerError::Overlap(_)));
        assert!(err.to_string().contains("stage is already booked"), "{}", err);
    }

    #[test]
    fn test_same_artist_across_stages_rejected() {
        let artist = Uuid::new_v4();
        let existing = vec![set(artist, Uuid::new_v4(), Some(at(21, 0)), Some(at(22, 0)))];

        let proposed = proposal(artist, Uuid::new_v4(), at(21, 30), at(22, 30));
        let err = check_proposed(&proposed, &existing).unwrap_err();

        assert!(err.to_string().contains("artist is already performing"), "{}", err);
    }

    #[test]
    fn test_other_artist_on_other_stage_allowed() {
        let existing = vec![set(Uuid::new_v4(), Uuid::new_v4(), Some(at(21, 0)), Some(at(22, 0)))];

        let proposed = proposal(Uuid::new_v4(), Uuid::new_v4(), at(21, 0), at(22, 0));
        assert!(check_proposed(&proposed, &existing).is_ok());
    }

    #[test]
    fn test_partial_windows_never_conflict() {
        let main = Uuid::new_v4();
        let existing = vec![set(Uuid::new_v4(), main, Some(at(21, 0)), None)];

        let proposed = proposal(Uuid::new_v4(), main, at(20, 0), at(23, 0));
        assert!(check_proposed(&proposed, &existing).is_ok());

        let open_ended = ProposedSet { end: None, ..proposal(Uuid::new_v4(), main, at(20, 0), at(23, 0)) };
        let full = vec![set(Uuid::new_v4(), main, Some(at(21, 0)), Some(at(22, 0)))];
        assert!(check_proposed(&open_ended, &full).is_ok());
    }

    #[test]
    fn test_rescheduling_ignores_itself() {
        let main = Uuid::new_v4();
        let existing = vec![set(Uuid::new_v4(), main, Some(at(21, 0)), Some(at(22, 0)))];

        let mut proposed = ProposedSet::from_assignment(&existing[0]);
        proposed.end = Some(at(22, 30));
        assert!(check_proposed(&proposed, &existing).is_ok());
    }

    #[test]
    fn test_conflict_report_groups_by_stage() {
        let main = stage("Main");
        let side = stage("Side");
        let quiet = stage("Quiet");

        let a = set(Uuid::new_v4(), main.id, Some(at(21, 0)), Some(at(22, 0)));
        let b = set(Uuid::new_v4(), main.id, Some(at(21, 30)), Some(at(23, 0)));
        let c = set(Uuid::new_v4(), main.id, Some(at(23, 0)), Some(at(23, 30)));
        let d = set(Uuid::new_v4(), side.id, Some(at(20, 0)), Some(at(21, 0)));
        let e = set(Uuid::new_v4(), quiet.id, Some(at(20, 0)), None);
        let assignments = [c.clone(), b.clone(), a.clone(), d, e];

        let report = conflict_report(&[main.clone(), side, quiet], &assignments);

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].stage_id, main.id);
        assert_eq!(report[0].stage_name, "Main");

        let performances = &report[0].conflicting_performances;
        assert_eq!(performances.len(), 2, "touching set c is not a conflict");
        assert_eq!(performances[0].assignment_id, a.id);
        assert_eq!(performances[0].overlaps_with, vec![b.id]);
        assert_eq!(performances[1].assignment_id, b.id);
        assert_eq!(performances[1].overlaps_with, vec![a.id]);
    }
}
