// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recurring meetup scheduling for CircleW.
//!
//! [`recurrence`] computes upcoming occurrence dates from a circle's cadence
//! rule (pure, no I/O). [`materializer`] reconciles those dates against the
//! persisted meetup rows and issues the minimal set of inserts needed to keep
//! the next N occurrences present without duplicating or disturbing
//! manually rescheduled rows.

pub mod materializer;
pub mod recurrence;

pub use materializer::{EnsureOutcome, MeetupMaterializer};
pub use recurrence::compute_dates;
