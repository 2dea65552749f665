// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signaling channel trait for 1:1 call setup.

use async_trait::async_trait;

use crate::error::CirclewError;
use crate::types::SignalMessage;

/// An append-only signaling channel keyed by room id, polled by both peers.
///
/// Delivery is poll-based; there is no ack or dequeue. A message fetched in
/// one poll tick will be fetched again in the next, so every consumer must be
/// idempotent under redelivery.
#[async_trait]
pub trait SignalChannel: Send + Sync {
    /// Append one signal to the channel.
    async fn append(&self, msg: &SignalMessage) -> Result<(), CirclewError>;

    /// All signals for a room not sent by `exclude_sender`, ordered by
    /// `created_at` ascending.
    async fn fetch_room(
        &self,
        room_id: &str,
        exclude_sender: &str,
    ) -> Result<Vec<SignalMessage>, CirclewError>;
}
