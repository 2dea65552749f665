// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller/answerer role resolution.

use circlew_core::types::CallRoom;

/// Role of this peer in a 1:1 call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRole {
    /// The room's requester; creates and sends the offer.
    Caller,
    /// Any other participant; waits for the offer and answers it.
    Answerer,
}

/// Resolve this peer's role from the room's requester id.
///
/// Computed once at call start and fixed for the call's lifetime. The role is
/// always derived, never stored.
pub fn resolve_role(current_user_id: &str, room: &CallRoom) -> CallRole {
    if current_user_id == room.requester_id {
        CallRole::Caller
    } else {
        CallRole::Answerer
    }
}
