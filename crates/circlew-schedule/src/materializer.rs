// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciles computed occurrence dates against persisted meetup rows.
//!
//! `ensure_upcoming` is idempotent: with an unchanged rule, repeated calls
//! return the same occurrences and issue zero inserts. Two concurrent calls
//! for the same circle can still race and both insert the same missing date;
//! the occupied-date check runs per call, not under a lock. That race is a
//! known, accepted limitation of the polling-style backend.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use circlew_core::error::CirclewError;
use circlew_core::traits::MeetupStore;
use circlew_core::types::{MeetupOccurrence, MeetupStatus, OccurrenceDefaults, RecurrenceRule};

use crate::recurrence;

/// Default width of the reconciliation window, in days. A heuristic;
/// tunable, not load-bearing.
pub const DEFAULT_RECONCILE_WINDOW_DAYS: u64 = 3;

/// Result of [`MeetupMaterializer::ensure_upcoming`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnsureOutcome {
    /// The next occurrences for the circle, ascending by date.
    pub occurrences: Vec<MeetupOccurrence>,
    /// True when the storage schema lacks the circle-linkage column and the
    /// caller should fall back to a computed-only display.
    pub needs_migration: bool,
}

/// Keeps a circle's future meetup rows in step with its recurrence rule.
pub struct MeetupMaterializer {
    store: Arc<dyn MeetupStore>,
    reconcile_window_days: u64,
}

impl MeetupMaterializer {
    pub fn new(store: Arc<dyn MeetupStore>) -> Self {
        Self {
            store,
            reconcile_window_days: DEFAULT_RECONCILE_WINDOW_DAYS,
        }
    }

    /// Override the reconciliation window used by [`next_meetup`](Self::next_meetup).
    pub fn with_reconcile_window(mut self, days: u64) -> Self {
        self.reconcile_window_days = days;
        self
    }

    /// Ensure the next `count` occurrences exist for `circle_id`, inserting
    /// only the dates that are missing.
    ///
    /// Existing rows are never modified: occurrences on dates that already
    /// have any row for the circle (past, rescheduled, or cancelled) are left
    /// alone. A schema-mismatch from storage degrades to an empty result with
    /// `needs_migration` set instead of failing.
    pub async fn ensure_upcoming(
        &self,
        circle_id: &str,
        rule: &RecurrenceRule,
        defaults: &OccurrenceDefaults,
        count: usize,
        today: NaiveDate,
    ) -> Result<EnsureOutcome, CirclewError> {
        let existing = match self.store.list_occurrences(circle_id).await {
            Ok(rows) => rows,
            Err(CirclewError::SchemaMismatch { table, column }) => {
                warn!(
                    %table,
                    %column,
                    circle_id,
                    "meetup table predates circle linkage; returning computed-only view"
                );
                return Ok(EnsureOutcome {
                    occurrences: Vec::new(),
                    needs_migration: true,
                });
            }
            Err(err) => return Err(err),
        };

        // Future rows matching the current rule's weekday. Rows left over
        // from a previous, since-changed rule fall out here.
        let mut upcoming: Vec<MeetupOccurrence> = existing
            .iter()
            .filter(|o| o.date >= today)
            .filter(|o| o.status != MeetupStatus::Cancelled)
            .filter(|o| rule.weekday.is_none_or(|wd| o.date.weekday() == wd))
            .cloned()
            .collect();

        if upcoming.len() >= count {
            upcoming.truncate(count);
            debug!(circle_id, count, "upcoming occurrences already materialized");
            return Ok(EnsureOutcome {
                occurrences: upcoming,
                needs_migration: false,
            });
        }

        let computed = recurrence::compute_dates(rule, count, today);

        // Occupied dates come from ALL existing rows, not just the filtered
        // future ones, so a past or rescheduled row still blocks its date.
        let mut occupied: BTreeSet<NaiveDate> = existing.iter().map(|o| o.date).collect();
        let now = Utc::now();
        let mut new_rows = Vec::new();
        for date in computed {
            if !occupied.insert(date) {
                continue;
            }
            new_rows.push(MeetupOccurrence {
                id: Uuid::new_v4().to_string(),
                circle_id: circle_id.to_string(),
                date,
                time_of_day: defaults.time_of_day.clone(),
                location: defaults.location.clone(),
                topic: defaults.default_topic(),
                duration_minutes: None,
                participant_limit: defaults.participant_limit,
                description: defaults.description.clone(),
                vibe_category: defaults.vibe_category.clone(),
                status: MeetupStatus::Scheduled,
                updated_at: now,
            });
        }

        if !new_rows.is_empty() {
            if let Err(err) = self.store.insert_occurrences(&new_rows).await {
                // Insert failures must not fail the read path.
                warn!(
                    error = %err,
                    circle_id,
                    attempted = new_rows.len(),
                    "occurrence insert failed; returning existing rows"
                );
                return Ok(EnsureOutcome {
                    occurrences: upcoming,
                    needs_migration: false,
                });
            }
            info!(circle_id, inserted = new_rows.len(), "materialized occurrences");
        }

        upcoming.extend(new_rows);
        upcoming.sort_by_key(|o| o.date);
        upcoming.truncate(count);
        Ok(EnsureOutcome {
            occurrences: upcoming,
            needs_migration: false,
        })
    }

    /// The circle's real next meetup, reconciling auto-generated phantoms
    /// against manual reschedules.
    ///
    /// Among future occurrences whose dates fall within the reconciliation
    /// window of the earliest one, the most recently edited row wins (a
    /// manual reschedule overrides a generated neighbor); otherwise the
    /// earlier date wins.
    pub fn next_meetup<'a>(
        &self,
        occurrences: &'a [MeetupOccurrence],
        today: NaiveDate,
    ) -> Option<&'a MeetupOccurrence> {
        let mut future: Vec<&MeetupOccurrence> = occurrences
            .iter()
            .filter(|o| o.date >= today && o.status != MeetupStatus::Cancelled)
            .collect();
        future.sort_by_key(|o| o.date);

        let first = *future.first()?;
        let window_end = first.date + Days::new(self.reconcile_window_days);
        future
            .iter()
            .take_while(|o| o.date <= window_end)
            .copied()
            .max_by(|a, b| {
                a.updated_at
                    .cmp(&b.updated_at)
                    .then_with(|| b.date.cmp(&a.date))
            })
    }

    /// Delete every future occurrence for the circle and clear its recurrence
    /// rule so materialization stops until the host sets a new one.
    ///
    /// Rows are deleted by explicit id list so storage-side row-level
    /// authorization applies to each row.
    pub async fn delete_all_future(
        &self,
        circle_id: &str,
        today: NaiveDate,
    ) -> Result<usize, CirclewError> {
        let existing = self.store.list_occurrences(circle_id).await?;
        let ids: Vec<String> = existing
            .iter()
            .filter(|o| o.date >= today)
            .map(|o| o.id.clone())
            .collect();

        if !ids.is_empty() {
            self.store.delete_occurrences(&ids).await?;
        }
        self.store.clear_recurrence(circle_id).await?;
        info!(
            circle_id,
            deleted = ids.len(),
            "deleted future occurrences and cleared recurrence rule"
        );
        Ok(ids.len())
    }

    /// Delete exactly one occurrence. The circle's rule is untouched.
    pub async fn delete_occurrence(&self, id: &str) -> Result<(), CirclewError> {
        self.store.delete_occurrences(&[id.to_string()]).await
    }
}
