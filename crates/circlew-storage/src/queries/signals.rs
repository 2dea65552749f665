// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only call-signal row operations.
//!
//! Signals are never updated, acked, or deleted while a call is live; both
//! peers poll the full room history and deduplicate on their side.

use circlew_core::error::CirclewError;
use circlew_core::types::SignalMessage;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::signal_from_row;

/// Append one signal row.
pub async fn append(db: &Database, msg: &SignalMessage) -> Result<(), CirclewError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO call_signals (id, room_id, kind, payload, sender_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    msg.id,
                    msg.room_id,
                    msg.kind.to_string(),
                    msg.payload,
                    msg.sender_id,
                    msg.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All signals for a room not sent by `exclude_sender`, oldest first.
pub async fn fetch_room(
    db: &Database,
    room_id: &str,
    exclude_sender: &str,
) -> Result<Vec<SignalMessage>, CirclewError> {
    let room_id = room_id.to_string();
    let exclude_sender = exclude_sender.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, room_id, kind, payload, sender_id, created_at
                 FROM call_signals
                 WHERE room_id = ?1 AND sender_id != ?2
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map(params![room_id, exclude_sender], signal_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}
