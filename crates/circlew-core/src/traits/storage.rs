// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage collaborator trait for circles and meetup occurrences.

use async_trait::async_trait;

use crate::error::CirclewError;
use crate::types::{Circle, MeetupOccurrence};

/// Row-level access to the circle and meetup tables.
///
/// The core assumes nothing beyond filtered selects, batch inserts, and
/// deletes by explicit id -- no transactions, upserts, or server-side
/// triggers. Deletes take id lists (not bulk predicates) so storage-side
/// row-level authorization applies per row.
#[async_trait]
pub trait MeetupStore: Send + Sync {
    /// Fetch a circle by id.
    async fn get_circle(&self, circle_id: &str) -> Result<Option<Circle>, CirclewError>;

    /// All occurrences for a circle (past and future), ascending by date.
    ///
    /// Returns [`CirclewError::SchemaMismatch`] when the backing table lacks
    /// the circle-linkage column, signalling degraded mode to the caller.
    async fn list_occurrences(
        &self,
        circle_id: &str,
    ) -> Result<Vec<MeetupOccurrence>, CirclewError>;

    /// Batch-insert newly materialized occurrences.
    async fn insert_occurrences(&self, rows: &[MeetupOccurrence]) -> Result<(), CirclewError>;

    /// Delete specific occurrences by id.
    async fn delete_occurrences(&self, ids: &[String]) -> Result<(), CirclewError>;

    /// Null out a circle's recurrence fields so materialization stops.
    async fn clear_recurrence(&self, circle_id: &str) -> Result<(), CirclewError>;
}
