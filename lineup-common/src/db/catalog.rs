//! Reference data inserts
//!
//! Venues, artists and events are owned by other subsystems (profiles, event
//! creation). These inserts exist for imports and fixtures.

use crate::db::models::{ArtistSummary, Event, Venue};
use crate::time;
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn insert_venue(
    pool: &SqlitePool,
    name: &str,
    address: Option<&str>,
    capacity: Option<i64>,
) -> Result<Venue> {
    let id = Uuid::new_v4();

    sqlx::query("INSERT INTO venues (id, name, address, capacity) VALUES (?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(address)
        .bind(capacity)
        .execute(pool)
        .await?;

    Ok(Venue {
        id,
        name: name.to_string(),
        address: address.map(str::to_string),
        capacity,
    })
}

pub async fn insert_artist(
    pool: &SqlitePool,
    name: &str,
    avatar: Option<&str>,
    bio: Option<&str>,
) -> Result<ArtistSummary> {
    let id = Uuid::new_v4();

    sqlx::query("INSERT INTO artists (id, name, avatar_img, bio) VALUES (?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(avatar)
        .bind(bio)
        .execute(pool)
        .await?;

    Ok(ArtistSummary {
        id,
        name: name.to_string(),
        avatar: avatar.map(str::to_string),
    })
}

pub async fn insert_event(
    pool: &SqlitePool,
    name: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    venue: Option<Uuid>,
) -> Result<Event> {
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO events (id, name, start_time, end_time, venue) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(name)
    .bind(start.as_ref().map(time::to_db))
    .bind(end.as_ref().map(time::to_db))
    .bind(venue.map(|v| v.to_string()))
    .execute(pool)
    .await?;

    Ok(Event {
        id,
        name: name.to_string(),
        start,
        end,
        venue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;

    #[tokio::test]
    async fn test_event_with_unknown_venue_is_rejected() {
        let pool = init_memory_database().await.unwrap();

        let result = insert_event(&pool, "Orphan", None, None, Some(Uuid::new_v4())).await;
        assert!(result.is_err(), "Foreign key on events.venue should be enforced");
    }

    #[tokio::test]
    async fn test_inserts_are_readable() {
        let pool = init_memory_database().await.unwrap();

        let venue = insert_venue(&pool, "Warehouse", Some("Dock 4"), Some(800)).await.unwrap();
        let event = insert_event(&pool, "Night One", None, None, Some(venue.id)).await.unwrap();
        insert_artist(&pool, "DJ X", None, Some("Selector")).await.unwrap();

        let (name, stored_venue): (String, Option<String>) =
            sqlx::query_as("SELECT name, venue FROM events WHERE id = ?")
                .bind(event.id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();

        assert_eq!(name, "Night One");
        assert_eq!(stored_venue, Some(venue.id.to_string()));

        let artists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artists")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(artists, 1);
    }
}
