// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! 1:1 WebRTC call setup for CircleW.
//!
//! A per-peer state machine polls the append-only signaling channel to
//! exchange exactly one offer, one answer, and any number of ICE candidates,
//! tolerant of reordering and redelivery. The caller role belongs to the
//! room's requester; everyone else answers.
//!
//! Signal delivery is polling, not push -- simpler to reason about than a
//! realtime subscription and indifferent to dropped notifications. The loop
//! runs on an explicit cancellable token so teardown is a first-class,
//! testable operation.

pub mod machine;
pub mod role;
pub mod state;

pub use machine::CallSetup;
pub use role::{resolve_role, CallRole};
pub use state::CallPhase;
