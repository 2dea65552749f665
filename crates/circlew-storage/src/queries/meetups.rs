// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Meetup occurrence row operations.
//!
//! Every read probes for the `circle_id` column first: a deployment whose
//! `meetups` table predates circle linkage gets a `SchemaMismatch` back so
//! callers can degrade instead of erroring on raw SQL.

use circlew_core::error::CirclewError;
use circlew_core::types::MeetupOccurrence;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::meetup_from_row;

const SELECT_COLUMNS: &str = "id, circle_id, date, time_of_day, location, topic, \
     duration_minutes, participant_limit, description, vibe_category, status, updated_at";

/// Whether the `meetups` table carries the `circle_id` linkage column.
pub async fn has_circle_link(db: &Database) -> Result<bool, CirclewError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('meetups')")?;
            let mut found = false;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let name: String = row.get(0)?;
                if name == "circle_id" {
                    found = true;
                    break;
                }
            }
            Ok(found)
        })
        .await
        .map_err(map_tr_err)
}

/// All occurrences for a circle, past and future, ascending by date.
pub async fn list_for_circle(
    db: &Database,
    circle_id: &str,
) -> Result<Vec<MeetupOccurrence>, CirclewError> {
    if !has_circle_link(db).await? {
        return Err(CirclewError::SchemaMismatch {
            table: "meetups".into(),
            column: "circle_id".into(),
        });
    }
    let circle_id = circle_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM meetups WHERE circle_id = ?1 ORDER BY date ASC",
            ))?;
            let rows = stmt
                .query_map(params![circle_id], meetup_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Batch-insert occurrences. All rows land in one transaction.
pub async fn insert_batch(db: &Database, rows: &[MeetupOccurrence]) -> Result<(), CirclewError> {
    let rows = rows.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for row in &rows {
                tx.execute(
                    "INSERT INTO meetups (id, circle_id, date, time_of_day, location, topic,
                                          duration_minutes, participant_limit, description,
                                          vibe_category, status, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        row.id,
                        row.circle_id,
                        row.date.to_string(),
                        row.time_of_day,
                        row.location,
                        row.topic,
                        row.duration_minutes,
                        row.participant_limit,
                        row.description,
                        row.vibe_category,
                        row.status.to_string(),
                        row.updated_at.to_rfc3339(),
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete occurrences by explicit id, one statement per id so row-level
/// authorization in the backend applies per row.
pub async fn delete_by_ids(db: &Database, ids: &[String]) -> Result<(), CirclewError> {
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            for id in &ids {
                conn.execute("DELETE FROM meetups WHERE id = ?1", params![id])?;
            }
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use circlew_core::types::{Circle, MeetupStatus};
    use tempfile::tempdir;

    use crate::queries::circles;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        circles::create_circle(
            &db,
            &Circle {
                id: "c1".into(),
                name: "Morning Walkers".into(),
                meeting_day: Some("Wednesday".into()),
                cadence: Some("Weekly".into()),
                time_of_day: None,
                location: None,
                max_members: None,
                description: None,
                vibe_category: None,
            },
        )
        .await
        .unwrap();
        (db, dir)
    }

    fn occurrence(id: &str, date: NaiveDate) -> MeetupOccurrence {
        MeetupOccurrence {
            id: id.to_string(),
            circle_id: "c1".to_string(),
            date,
            time_of_day: Some("07:00".into()),
            location: None,
            topic: "Morning Walkers Meetup".into(),
            duration_minutes: Some(60),
            participant_limit: None,
            description: None,
            vibe_category: None,
            status: MeetupStatus::Scheduled,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_list_orders_by_date() {
        let (db, _dir) = setup_db().await;
        let later = occurrence("m2", NaiveDate::from_ymd_opt(2025, 6, 11).unwrap());
        let earlier = occurrence("m1", NaiveDate::from_ymd_opt(2025, 6, 4).unwrap());
        insert_batch(&db, &[later, earlier]).await.unwrap();

        let rows = list_for_circle(&db, "c1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "m1");
        assert_eq!(rows[1].id, "m2");
        assert_eq!(
            rows[0].date,
            NaiveDate::from_ymd_opt(2025, 6, 4).unwrap()
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_by_ids_removes_only_named_rows() {
        let (db, _dir) = setup_db().await;
        insert_batch(
            &db,
            &[
                occurrence("m1", NaiveDate::from_ymd_opt(2025, 6, 4).unwrap()),
                occurrence("m2", NaiveDate::from_ymd_opt(2025, 6, 11).unwrap()),
            ],
        )
        .await
        .unwrap();

        delete_by_ids(&db, &["m1".to_string()]).await.unwrap();

        let rows = list_for_circle(&db, "c1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "m2");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_circle_link_column_reports_schema_mismatch() {
        let (db, _dir) = setup_db().await;
        // Simulate a deployment whose meetups table predates circle linkage.
        db.connection()
            .call(|conn| {
                conn.execute_batch(
                    "DROP TABLE meetups;
                     CREATE TABLE meetups (
                         id TEXT PRIMARY KEY,
                         date TEXT NOT NULL,
                         topic TEXT NOT NULL,
                         status TEXT NOT NULL DEFAULT 'scheduled',
                         updated_at TEXT NOT NULL
                     );",
                )?;
                Ok::<_, rusqlite::Error>(())
            })
            .await
            .unwrap();

        let err = list_for_circle(&db, "c1").await.unwrap_err();
        assert!(matches!(
            err,
            CirclewError::SchemaMismatch { ref table, ref column }
                if table == "meetups" && column == "circle_id"
        ));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_id_insert_fails_whole_batch() {
        let (db, _dir) = setup_db().await;
        let occ = occurrence("m1", NaiveDate::from_ymd_opt(2025, 6, 4).unwrap());
        insert_batch(&db, std::slice::from_ref(&occ)).await.unwrap();

        let dup = occurrence("m1", NaiveDate::from_ymd_opt(2025, 6, 11).unwrap());
        assert!(insert_batch(&db, &[dup]).await.is_err());
        assert_eq!(list_for_circle(&db, "c1").await.unwrap().len(), 1);
        db.close().await.unwrap();
    }
}
