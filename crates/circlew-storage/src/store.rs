// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementations of the core collaborator traits.
//!
//! Thin wrappers over a [`Database`] handle that delegate to the typed query
//! modules. Both wrappers can share one handle; all access is serialized on
//! the connection's background thread.

use async_trait::async_trait;

use circlew_core::error::CirclewError;
use circlew_core::traits::{MeetupStore, SignalChannel};
use circlew_core::types::{Circle, MeetupOccurrence, SignalMessage};

use crate::database::Database;
use crate::queries;

/// SQLite-backed [`MeetupStore`].
#[derive(Clone)]
pub struct SqliteMeetupStore {
    db: Database,
}

impl SqliteMeetupStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MeetupStore for SqliteMeetupStore {
    async fn get_circle(&self, circle_id: &str) -> Result<Option<Circle>, CirclewError> {
        queries::circles::get_circle(&self.db, circle_id).await
    }

    async fn list_occurrences(
        &self,
        circle_id: &str,
    ) -> Result<Vec<MeetupOccurrence>, CirclewError> {
        queries::meetups::list_for_circle(&self.db, circle_id).await
    }

    async fn insert_occurrences(&self, rows: &[MeetupOccurrence]) -> Result<(), CirclewError> {
        queries::meetups::insert_batch(&self.db, rows).await
    }

    async fn delete_occurrences(&self, ids: &[String]) -> Result<(), CirclewError> {
        queries::meetups::delete_by_ids(&self.db, ids).await
    }

    async fn clear_recurrence(&self, circle_id: &str) -> Result<(), CirclewError> {
        queries::circles::clear_recurrence(&self.db, circle_id).await
    }
}

/// SQLite-backed [`SignalChannel`].
#[derive(Clone)]
pub struct SqliteSignalChannel {
    db: Database,
}

impl SqliteSignalChannel {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SignalChannel for SqliteSignalChannel {
    async fn append(&self, msg: &SignalMessage) -> Result<(), CirclewError> {
        queries::signals::append(&self.db, msg).await
    }

    async fn fetch_room(
        &self,
        room_id: &str,
        exclude_sender: &str,
    ) -> Result<Vec<SignalMessage>, CirclewError> {
        queries::signals::fetch_room(&self.db, room_id, exclude_sender).await
    }
}
