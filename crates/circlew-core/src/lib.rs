// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the CircleW meetup and call-setup engine.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the CircleW workspace. The scheduling and
//! call-setup crates consume external collaborators (hosted storage, the
//! signaling table, the platform WebRTC stack) only through traits defined
//! here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CirclewError;
pub use types::{
    CallRoom, Circle, MeetupOccurrence, MeetupStatus, RecurrenceRule, SignalKind, SignalMessage,
};

// Re-export all collaborator traits at crate root.
pub use traits::{LocalMedia, MediaSource, MeetupStore, PeerConnection, SignalChannel};
