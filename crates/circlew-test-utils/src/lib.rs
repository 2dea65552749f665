// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic test doubles for the CircleW collaborator traits.
//!
//! An in-memory [`MeetupStore`](circlew_core::MeetupStore), an in-memory
//! [`SignalChannel`](circlew_core::SignalChannel), and a mock WebRTC stack
//! with call-count capture for asserting idempotence and teardown behavior.

pub mod memory_channel;
pub mod memory_store;
pub mod mock_rtc;

pub use memory_channel::MemorySignalChannel;
pub use memory_store::MemoryMeetupStore;
pub use mock_rtc::{MockMedia, MockMediaSource, MockPeerConnection};
