// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory append-only `SignalChannel`.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use circlew_core::error::CirclewError;
use circlew_core::traits::SignalChannel;
use circlew_core::types::{SignalKind, SignalMessage};

/// An append-only in-memory signaling channel.
///
/// Like the hosted table it stands in for, it never dequeues: `fetch_room`
/// returns the full filtered history on every call, so consumers see
/// redelivery exactly as they would in production polling.
pub struct MemorySignalChannel {
    messages: Mutex<Vec<SignalMessage>>,
}

impl MemorySignalChannel {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Append a signal built from parts, returning its generated id.
    pub async fn push(
        &self,
        room_id: &str,
        kind: SignalKind,
        payload: &str,
        sender_id: &str,
    ) -> String {
        let msg = SignalMessage {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            kind,
            payload: payload.to_string(),
            sender_id: sender_id.to_string(),
            created_at: Utc::now(),
        };
        let id = msg.id.clone();
        self.messages.lock().await.push(msg);
        id
    }

    /// Every message appended so far, in append order.
    pub async fn all_messages(&self) -> Vec<SignalMessage> {
        self.messages.lock().await.clone()
    }

    /// Count of messages of `kind` sent by `sender_id`.
    pub async fn count_from(&self, sender_id: &str, kind: SignalKind) -> usize {
        self.messages
            .lock()
            .await
            .iter()
            .filter(|m| m.sender_id == sender_id && m.kind == kind)
            .count()
    }
}

impl Default for MemorySignalChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalChannel for MemorySignalChannel {
    async fn append(&self, msg: &SignalMessage) -> Result<(), CirclewError> {
        self.messages.lock().await.push(msg.clone());
        Ok(())
    }

    async fn fetch_room(
        &self,
        room_id: &str,
        exclude_sender: &str,
    ) -> Result<Vec<SignalMessage>, CirclewError> {
        let mut rows: Vec<SignalMessage> = self
            .messages
            .lock()
            .await
            .iter()
            .filter(|m| m.room_id == room_id && m.sender_id != exclude_sender)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}
