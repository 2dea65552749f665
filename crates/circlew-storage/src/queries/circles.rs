// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Circle row operations.

use circlew_core::error::CirclewError;
use circlew_core::types::Circle;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::circle_from_row;

/// Create a circle.
pub async fn create_circle(db: &Database, circle: &Circle) -> Result<(), CirclewError> {
    let circle = circle.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO circles (id, name, meeting_day, cadence, time_of_day, location,
                                      max_members, description, vibe_category)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    circle.id,
                    circle.name,
                    circle.meeting_day,
                    circle.cadence,
                    circle.time_of_day,
                    circle.location,
                    circle.max_members,
                    circle.description,
                    circle.vibe_category,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a circle by id.
pub async fn get_circle(db: &Database, id: &str) -> Result<Option<Circle>, CirclewError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, meeting_day, cadence, time_of_day, location,
                        max_members, description, vibe_category
                 FROM circles WHERE id = ?1",
            )?;
            let result = stmt.query_row(params![id], circle_from_row);
            match result {
                Ok(circle) => Ok(Some(circle)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Null out a circle's recurrence fields so materialization stops.
pub async fn clear_recurrence(db: &Database, id: &str) -> Result<(), CirclewError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE circles SET meeting_day = NULL, cadence = NULL, time_of_day = NULL
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
