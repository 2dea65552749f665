// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite rows and the core domain types.
//!
//! Dates are stored as `YYYY-MM-DD` text (calendar dates, never UTC-shifted);
//! timestamps as RFC 3339 text.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

use circlew_core::types::{Circle, MeetupOccurrence, MeetupStatus, SignalKind, SignalMessage};

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn parse_date(idx: usize, text: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| conversion_err(idx, e))
}

pub(crate) fn parse_timestamp(idx: usize, text: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

/// Map a `circles` row selected in schema column order.
pub(crate) fn circle_from_row(row: &Row<'_>) -> Result<Circle, rusqlite::Error> {
    Ok(Circle {
        id: row.get(0)?,
        name: row.get(1)?,
        meeting_day: row.get(2)?,
        cadence: row.get(3)?,
        time_of_day: row.get(4)?,
        location: row.get(5)?,
        max_members: row.get(6)?,
        description: row.get(7)?,
        vibe_category: row.get(8)?,
    })
}

/// Map a `meetups` row selected in schema column order.
pub(crate) fn meetup_from_row(row: &Row<'_>) -> Result<MeetupOccurrence, rusqlite::Error> {
    let date: String = row.get(2)?;
    let status: String = row.get(10)?;
    let updated_at: String = row.get(11)?;
    Ok(MeetupOccurrence {
        id: row.get(0)?,
        circle_id: row.get(1)?,
        date: parse_date(2, &date)?,
        time_of_day: row.get(3)?,
        location: row.get(4)?,
        topic: row.get(5)?,
        duration_minutes: row.get(6)?,
        participant_limit: row.get(7)?,
        description: row.get(8)?,
        vibe_category: row.get(9)?,
        status: MeetupStatus::from_str(&status).map_err(|e| conversion_err(10, e))?,
        updated_at: parse_timestamp(11, &updated_at)?,
    })
}

/// Map a `call_signals` row selected in schema column order.
pub(crate) fn signal_from_row(row: &Row<'_>) -> Result<SignalMessage, rusqlite::Error> {
    let kind: String = row.get(2)?;
    let created_at: String = row.get(5)?;
    Ok(SignalMessage {
        id: row.get(0)?,
        room_id: row.get(1)?,
        kind: SignalKind::from_str(&kind).map_err(|e| conversion_err(2, e))?,
        payload: row.get(3)?,
        sender_id: row.get(4)?,
        created_at: parse_timestamp(5, &created_at)?,
    })
}
