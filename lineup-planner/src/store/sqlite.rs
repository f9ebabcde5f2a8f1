//! SQLite implementation of the lineup store
//!
//! Each operation is one statement (plus a read-back of the affected row), so
//! atomicity is per statement only. A cross-stage move is a single UPDATE of
//! the stage column.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use lineup_common::db::{ArtistSummary, Assignment, Event, ScheduleEntry, Stage};
use lineup_common::time;
use lineup_common::{Error, Result};

use super::{AssignmentPatch, LineupStore, NewAssignment, NewStage};

const ASSIGNMENT_COLUMNS: &str = r#"
    a.id, a.artist, a.event, a.stage, a.set_start, a.set_end,
    ar.name AS artist_name, ar.avatar_img AS artist_avatar
"#;

/// Lineup store backed by an SQLite pool
#[derive(Clone)]
pub struct SqliteLineupStore {
    pool: SqlitePool,
}

impl SqliteLineupStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_assignment(&self, assignment_id: Uuid) -> Result<Assignment> {
        let sql = format!(
            "SELECT {} FROM event_stage_artists a JOIN artists ar ON ar.id = a.artist WHERE a.id = ?",
            ASSIGNMENT_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(assignment_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Assignment {}", assignment_id)))?;

        assignment_from_row(&row)
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("Invalid UUID '{}' in database: {}", raw, e)))
}

fn parse_opt_uuid(raw: Option<String>) -> Result<Option<Uuid>> {
    raw.as_deref().map(parse_uuid).transpose()
}

fn event_from_row(row: &SqliteRow) -> Result<Event> {
    Ok(Event {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        name: row.get("name"),
        start: time::opt_from_db(row.get("start_time"))?,
        end: time::opt_from_db(row.get("end_time"))?,
        venue: parse_opt_uuid(row.get("venue"))?,
    })
}

fn stage_from_row(row: &SqliteRow) -> Result<Stage> {
    Ok(Stage {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        event: parse_uuid(&row.get::<String, _>("event"))?,
        name: row.get("name"),
        venue: parse_opt_uuid(row.get("venue"))?,
    })
}

fn assignment_from_row(row: &SqliteRow) -> Result<Assignment> {
    let artist = parse_uuid(&row.get::<String, _>("artist"))?;

    Ok(Assignment {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        artist,
        event: parse_uuid(&row.get::<String, _>("event"))?,
        stage: parse_opt_uuid(row.get("stage"))?,
        start: time::opt_from_db(row.get("set_start"))?,
        end: time::opt_from_db(row.get("set_end"))?,
        artist_info: ArtistSummary {
            id: artist,
            name: row.get("artist_name"),
            avatar: row.get("artist_avatar"),
        },
    })
}

#[async_trait]
impl LineupStore for SqliteLineupStore {
    async fn get_event(&self, event_id: Uuid) -> Result<Event> {
        let row = sqlx::query(
            "SELECT id, name, start_time, end_time, venue FROM events WHERE id = ?",
        )
        .bind(event_id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Event {}", event_id)))?;

        event_from_row(&row)
    }

    async fn list_stages(&self, event_id: Uuid) -> Result<Vec<Stage>> {
        let rows = sqlx::query(
            "SELECT id, event, name, venue FROM event_stage WHERE event = ? ORDER BY rowid ASC",
        )
        .bind(event_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(stage_from_row).collect()
    }

    async fn create_stage(&self, stage: NewStage) -> Result<Stage> {
        let venue = match stage.venue_id {
            Some(venue) => venue,
            None => self.get_event(stage.event_id).await?.venue.ok_or_else(|| {
                Error::InvalidInput(
                    "No venue specified for stage. Please select a venue for the event first."
                        .to_string(),
                )
            })?,
        };

        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO event_stage (id, event, name, venue) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(stage.event_id.to_string())
            .bind(&stage.name)
            .bind(venue.to_string())
            .execute(&self.pool)
            .await?;

        debug!("Inserted stage {} for event {}", id, stage.event_id);

        Ok(Stage {
            id,
            event: stage.event_id,
            name: stage.name,
            venue: Some(venue),
        })
    }

    async fn list_assignments(
        &self,
        event_id: Uuid,
        stage_id: Option<Uuid>,
    ) -> Result<Vec<Assignment>> {
        // NULL start times sort first in SQLite; ties keep insertion order
        let sql = format!(
            r#"
            SELECT {}
            FROM event_stage_artists a
            JOIN artists ar ON ar.id = a.artist
            WHERE a.event = ?1 AND (?2 IS NULL OR a.stage = ?2)
            ORDER BY a.set_start ASC, a.rowid ASC
            "#,
            ASSIGNMENT_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(event_id.to_string())
            .bind(stage_id.map(|s| s.to_string()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(assignment_from_row).collect()
    }

    async fn get_assignment(&self, assignment_id: Uuid) -> Result<Assignment> {
        self.fetch_assignment(assignment_id).await
    }

    async fn create_assignment(&self, assignment: NewAssignment) -> Result<Assignment> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO event_stage_artists (id, artist, event, stage, set_start, set_end)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(assignment.artist_id.to_string())
        .bind(assignment.event_id.to_string())
        .bind(assignment.stage_id.to_string())
        .bind(assignment.start.as_ref().map(time::to_db))
        .bind(assignment.end.as_ref().map(time::to_db))
        .execute(&self.pool)
        .await?;

        self.fetch_assignment(id).await
    }

    async fn update_assignment(
        &self,
        assignment_id: Uuid,
        patch: AssignmentPatch,
    ) -> Result<Assignment> {
        if patch.is_empty() {
            return self.fetch_assignment(assignment_id).await;
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE event_stage_artists SET ");
        {
            let mut sets = query.separated(", ");
            if let Some(stage) = patch.stage {
                sets.push("stage = ").push_bind_unseparated(stage.to_string());
            }
            if let Some(start) = patch.start {
                sets.push("set_start = ").push_bind_unseparated(start.as_ref().map(time::to_db));
            }
            if let Some(end) = patch.end {
                sets.push("set_end = ").push_bind_unseparated(end.as_ref().map(time::to_db));
            }
        }
        query.push(" WHERE id = ").push_bind(assignment_id.to_string());

        let result = query.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Assignment {}", assignment_id)));
        }

        self.fetch_assignment(assignment_id).await
    }

    async fn remove_assignment(&self, assignment_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM event_stage_artists WHERE id = ?")
            .bind(assignment_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Assignment {}", assignment_id)));
        }

        Ok(())
    }

    async fn list_artists(&self) -> Result<Vec<ArtistSummary>> {
        let rows = sqlx::query(
            "SELECT id, name, avatar_img FROM artists ORDER BY name COLLATE NOCASE ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ArtistSummary {
                    id: parse_uuid(&row.get::<String, _>("id"))?,
                    name: row.get("name"),
                    avatar: row.get("avatar_img"),
                })
            })
            .collect()
    }

    async fn artist_schedule(&self, artist_id: Uuid) -> Result<Vec<ScheduleEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.event, e.name AS event_name, a.stage, s.name AS stage_name,
                   a.set_start, a.set_end
            FROM event_stage_artists a
            JOIN events e ON e.id = a.event
            LEFT JOIN event_stage s ON s.id = a.stage
            WHERE a.artist = ?
            ORDER BY a.set_start ASC, a.rowid ASC
            "#,
        )
        .bind(artist_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ScheduleEntry {
                    assignment_id: parse_uuid(&row.get::<String, _>("id"))?,
                    event_id: parse_uuid(&row.get::<String, _>("event"))?,
                    event_name: row.get("event_name"),
                    stage_id: parse_opt_uuid(row.get("stage"))?,
                    stage_name: row.get("stage_name"),
                    start: time::opt_from_db(row.get("set_start"))?,
                    end: time::opt_from_db(row.get("set_end"))?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lineup_common::db::catalog::{insert_artist, insert_event, insert_venue};
    use lineup_common::db::init_memory_database;

    struct Fixture {
        store: SqliteLineupStore,
        event: Event,
        venue: Uuid,
    }

    async fn fixture() -> Fixture {
        let pool = init_memory_database().await.unwrap();
        let venue = insert_venue(&pool, "Warehouse", None, Some(900)).await.unwrap();
        let event = insert_event(&pool, "Night One", None, None, Some(venue.id)).await.unwrap();
        Fixture { store: SqliteLineupStore::new(pool), event, venue: venue.id }
    }

    fn at(hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_stage_defaults_to_event_venue() {
        let f = fixture().await;

        let stage = f
            .store
            .create_stage(NewStage { event_id: f.event.id, name: "Main".into(), venue_id: None })
            .await
            .unwrap();

        assert_eq!(stage.venue, Some(f.venue));
        assert_eq!(f.store.list_stages(f.event.id).await.unwrap(), vec![stage]);
    }

    #[tokio::test]
    async fn test_stage_without_any_venue_is_rejected() {
        let f = fixture().await;
        let bare = insert_event(f.store.pool(), "No Venue", None, None, None).await.unwrap();

        let err = f
            .store
            .create_stage(NewStage { event_id: bare.id, name: "Main".into(), venue_id: None })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_stage_for_unknown_event_is_not_found() {
        let f = fixture().await;

        let err = f
            .store
            .create_stage(NewStage { event_id: Uuid::new_v4(), name: "Main".into(), venue_id: None })
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_stages_keep_insertion_order_and_allow_duplicate_names() {
        let f = fixture().await;

        for name in ["Zeta", "Alpha", "Alpha"] {
            f.store
                .create_stage(NewStage { event_id: f.event.id, name: name.into(), venue_id: None })
                .await
                .unwrap();
        }

        let names: Vec<String> =
            f.store.list_stages(f.event.id).await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["Zeta", "Alpha", "Alpha"]);
    }

    #[tokio::test]
    async fn test_assignment_crud() {
        let f = fixture().await;
        let artist = insert_artist(f.store.pool(), "DJ X", Some("x.png"), None).await.unwrap();
        let main = f
            .store
            .create_stage(NewStage { event_id: f.event.id, name: "Main".into(), venue_id: None })
            .await
            .unwrap();
        let side = f
            .store
            .create_stage(NewStage { event_id: f.event.id, name: "Side".into(), venue_id: None })
            .await
            .unwrap();

        let created = f
            .store
            .create_assignment(NewAssignment {
                artist_id: artist.id,
                event_id: f.event.id,
                stage_id: main.id,
                start: None,
                end: None,
            })
            .await
            .unwrap();

        assert_eq!(created.stage, Some(main.id));
        assert_eq!(created.artist_info, artist);
        assert_eq!((created.start, created.end), (None, None));

        let moved = f
            .store
            .update_assignment(created.id, AssignmentPatch::move_to(side.id))
            .await
            .unwrap();
        assert_eq!(moved.id, created.id);
        assert_eq!(moved.stage, Some(side.id));

        let scheduled = f
            .store
            .update_assignment(created.id, AssignmentPatch::window(Some(at(21)), Some(at(22))))
            .await
            .unwrap();
        assert_eq!(scheduled.start, Some(at(21)));
        assert_eq!(scheduled.end, Some(at(22)));
        assert_eq!(scheduled.stage, Some(side.id), "time patch must not touch the stage");

        // Explicit null clears one bound only
        let cleared = f
            .store
            .update_assignment(
                created.id,
                AssignmentPatch { start: Some(None), ..AssignmentPatch::default() },
            )
            .await
            .unwrap();
        assert_eq!(cleared.start, None);
        assert_eq!(cleared.end, Some(at(22)));

        assert_eq!(f.store.list_assignments(f.event.id, Some(main.id)).await.unwrap(), vec![]);
        assert_eq!(f.store.list_assignments(f.event.id, Some(side.id)).await.unwrap().len(), 1);

        f.store.remove_assignment(created.id).await.unwrap();
        assert!(f.store.list_assignments(f.event.id, None).await.unwrap().is_empty());
        assert!(f.store.remove_assignment(created.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_assignment_to_unknown_stage_fails() {
        let f = fixture().await;
        let artist = insert_artist(f.store.pool(), "DJ X", None, None).await.unwrap();

        let err = f
            .store
            .create_assignment(NewAssignment {
                artist_id: artist.id,
                event_id: f.event.id,
                stage_id: Uuid::new_v4(),
                start: None,
                end: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Database(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_update_unknown_assignment_is_not_found() {
        let f = fixture().await;

        let err = f
            .store
            .update_assignment(Uuid::new_v4(), AssignmentPatch::move_to(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_assignments_ordered_by_start_unscheduled_first() {
        let f = fixture().await;
        let stage = f
            .store
            .create_stage(NewStage { event_id: f.event.id, name: "Main".into(), venue_id: None })
            .await
            .unwrap();

        let mut ids = Vec::new();
        for (name, start) in [("Late", Some(at(23))), ("Early", Some(at(20))), ("Tbd", None)] {
            let artist = insert_artist(f.store.pool(), name, None, None).await.unwrap();
            let created = f
                .store
                .create_assignment(NewAssignment {
                    artist_id: artist.id,
                    event_id: f.event.id,
                    stage_id: stage.id,
                    start,
                    end: None,
                })
                .await
                .unwrap();
            ids.push(created.artist_info.name);
        }
        assert_eq!(ids, ["Late", "Early", "Tbd"]);

        let names: Vec<String> = f
            .store
            .list_assignments(f.event.id, None)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.artist_info.name)
            .collect();
        assert_eq!(names, ["Tbd", "Early", "Late"]);
    }

    #[tokio::test]
    async fn test_artist_schedule_spans_events() {
        let f = fixture().await;
        let artist = insert_artist(f.store.pool(), "DJ X", None, None).await.unwrap();
        let second = insert_event(f.store.pool(), "Night Two", None, None, Some(f.venue))
            .await
            .unwrap();

        for (event, start) in [(second.id, at(22)), (f.event.id, at(20))] {
            let stage = f
                .store
                .create_stage(NewStage { event_id: event, name: "Main".into(), venue_id: None })
                .await
                .unwrap();
            f.store
                .create_assignment(NewAssignment {
                    artist_id: artist.id,
                    event_id: event,
                    stage_id: stage.id,
                    start: Some(start),
                    end: None,
                })
                .await
                .unwrap();
        }

        let schedule = f.store.artist_schedule(artist.id).await.unwrap();
        let events: Vec<&str> = schedule.iter().map(|s| s.event_name.as_str()).collect();
        assert_eq!(events, ["Night One", "Night Two"]);
        assert!(schedule.iter().all(|s| s.stage_name.as_deref() == Some("Main")));
    }

    #[tokio::test]
    async fn test_roster_sorted_by_name() {
        let f = fixture().await;
        for name in ["mono", "Aphex", "Burial"] {
            insert_artist(f.store.pool(), name, None, None).await.unwrap();
        }

        let names: Vec<String> =
            f.store.list_artists().await.unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, ["Aphex", "Burial", "mono"]);
    }
}
