// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebRTC platform traits: peer connection and local media.
//!
//! The call-setup state machine drives a platform peer connection through
//! these seams so the negotiation logic stays portable (and mockable) across
//! WebRTC-capable runtimes.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CirclewError;
use crate::types::{IceCandidate, PeerEvent, SessionDescription, SignalingState};

/// A WebRTC peer connection as the state machine sees it.
///
/// Implementations surface asynchronous platform callbacks (local ICE
/// candidates, remote track arrival, transport failure) as [`PeerEvent`]s on
/// the receiver handed out by [`PeerConnection::take_events`].
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Attach local media tracks. Must happen before any signaling is sent.
    async fn attach_tracks(&self, media: &dyn LocalMedia) -> Result<(), CirclewError>;

    async fn create_offer(&self) -> Result<SessionDescription, CirclewError>;

    async fn create_answer(&self) -> Result<SessionDescription, CirclewError>;

    async fn set_local_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), CirclewError>;

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), CirclewError>;

    /// Add a remote ICE candidate to the connection's pool.
    ///
    /// Callers guard against [`SignalingState::Closed`] before invoking this;
    /// implementations return [`CirclewError::PeerConnectionClosed`] if asked
    /// anyway.
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), CirclewError>;

    /// Current signaling state, mirrored as an explicit enum.
    fn signaling_state(&self) -> SignalingState;

    /// Take the event receiver. Yields `Some` exactly once; the machine owns
    /// the stream for the lifetime of the call.
    fn take_events(&self) -> Option<mpsc::Receiver<PeerEvent>>;

    /// Close the connection and release transports. Idempotent and sync so it
    /// can run during teardown paths that cannot await.
    fn close(&self);
}

/// Local audio+video tracks acquired from the user's devices.
///
/// Exclusively owned by one call attempt at a time; starting a new call must
/// tear down the old owner first.
pub trait LocalMedia: Send + Sync {
    /// Stop all tracks, releasing camera and microphone. Idempotent.
    fn stop(&self);

    fn is_stopped(&self) -> bool;

    /// Number of live tracks (0 once stopped).
    fn track_count(&self) -> usize;
}

/// Acquires local media, prompting the user for device permission.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Acquire audio+video tracks. On failure any partially acquired tracks
    /// are released before the error is returned.
    async fn acquire(&self) -> Result<Box<dyn LocalMedia>, CirclewError>;
}
