// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the scheduling and call-setup cores.
//!
//! The hosted backend (storage, signaling) and the platform WebRTC stack are
//! external collaborators; the core talks to them only through these seams.

pub mod rtc;
pub mod signal;
pub mod storage;

pub use rtc::{LocalMedia, MediaSource, PeerConnection};
pub use signal::SignalChannel;
pub use storage::MeetupStore;
