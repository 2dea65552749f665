// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory `MeetupStore` with injectable failure modes.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use circlew_core::error::CirclewError;
use circlew_core::traits::MeetupStore;
use circlew_core::types::{Circle, MeetupOccurrence};

/// An in-memory meetup store for materializer tests.
///
/// Failure injection:
/// - `set_schema_mismatch(true)` makes `list_occurrences` return
///   [`CirclewError::SchemaMismatch`], exercising degraded mode.
/// - `set_fail_inserts(true)` makes `insert_occurrences` fail, exercising the
///   non-fatal insert path.
///
/// `insert_calls` counts calls to `insert_occurrences` so tests can assert
/// idempotence ("second call issues zero inserts").
pub struct MemoryMeetupStore {
    circles: Mutex<HashMap<String, Circle>>,
    occurrences: Mutex<Vec<MeetupOccurrence>>,
    insert_calls: Mutex<usize>,
    fail_inserts: Mutex<bool>,
    schema_mismatch: Mutex<bool>,
}

impl MemoryMeetupStore {
    pub fn new() -> Self {
        Self {
            circles: Mutex::new(HashMap::new()),
            occurrences: Mutex::new(Vec::new()),
            insert_calls: Mutex::new(0),
            fail_inserts: Mutex::new(false),
            schema_mismatch: Mutex::new(false),
        }
    }

    /// Seed a circle row.
    pub async fn put_circle(&self, circle: Circle) {
        self.circles.lock().await.insert(circle.id.clone(), circle);
    }

    /// How many times `insert_occurrences` has been called.
    pub async fn insert_calls(&self) -> usize {
        *self.insert_calls.lock().await
    }

    pub async fn reset_insert_calls(&self) {
        *self.insert_calls.lock().await = 0;
    }

    pub async fn set_fail_inserts(&self, fail: bool) {
        *self.fail_inserts.lock().await = fail;
    }

    pub async fn set_schema_mismatch(&self, mismatch: bool) {
        *self.schema_mismatch.lock().await = mismatch;
    }
}

impl Default for MemoryMeetupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MeetupStore for MemoryMeetupStore {
    async fn get_circle(&self, circle_id: &str) -> Result<Option<Circle>, CirclewError> {
        Ok(self.circles.lock().await.get(circle_id).cloned())
    }

    async fn list_occurrences(
        &self,
        circle_id: &str,
    ) -> Result<Vec<MeetupOccurrence>, CirclewError> {
        if *self.schema_mismatch.lock().await {
            return Err(CirclewError::SchemaMismatch {
                table: "meetups".into(),
                column: "circle_id".into(),
            });
        }
        let mut rows: Vec<MeetupOccurrence> = self
            .occurrences
            .lock()
            .await
            .iter()
            .filter(|o| o.circle_id == circle_id)
            .cloned()
            .collect();
        rows.sort_by_key(|o| o.date);
        Ok(rows)
    }

    async fn insert_occurrences(&self, rows: &[MeetupOccurrence]) -> Result<(), CirclewError> {
        *self.insert_calls.lock().await += 1;
        if *self.fail_inserts.lock().await {
            return Err(CirclewError::Storage {
                source: "injected insert failure".into(),
            });
        }
        self.occurrences.lock().await.extend_from_slice(rows);
        Ok(())
    }

    async fn delete_occurrences(&self, ids: &[String]) -> Result<(), CirclewError> {
        self.occurrences
            .lock()
            .await
            .retain(|o| !ids.contains(&o.id));
        Ok(())
    }

    async fn clear_recurrence(&self, circle_id: &str) -> Result<(), CirclewError> {
        if let Some(circle) = self.circles.lock().await.get_mut(circle_id) {
            circle.meeting_day = None;
            circle.cadence = None;
            circle.time_of_day = None;
        }
        Ok(())
    }
}
