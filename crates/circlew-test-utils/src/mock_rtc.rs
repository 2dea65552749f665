// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock WebRTC peer connection and media source with call-count capture.
//!
//! `MockPeerConnection` follows real signaling-state transitions (an applied
//! remote offer moves `Stable -> HaveRemoteOffer`, a local answer moves back
//! to `Stable`, and so on) so state-guard logic in the call machine is
//! exercised against faithful behavior, not a permissive stub.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use circlew_core::error::CirclewError;
use circlew_core::traits::{LocalMedia, MediaSource, PeerConnection};
use circlew_core::types::{
    IceCandidate, PeerEvent, SdpKind, SessionDescription, SignalingState,
};

/// Mock peer connection recording every operation.
pub struct MockPeerConnection {
    state: StdMutex<SignalingState>,
    events_tx: mpsc::Sender<PeerEvent>,
    events_rx: StdMutex<Option<mpsc::Receiver<PeerEvent>>>,
    offers_created: AtomicUsize,
    answers_created: AtomicUsize,
    local_descriptions_set: AtomicUsize,
    remote_descriptions_set: AtomicUsize,
    candidates_added: AtomicUsize,
    tracks_attached: AtomicUsize,
    closed: AtomicBool,
    fail_create_offer: AtomicBool,
}

impl MockPeerConnection {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);
        Self {
            state: StdMutex::new(SignalingState::Stable),
            events_tx,
            events_rx: StdMutex::new(Some(events_rx)),
            offers_created: AtomicUsize::new(0),
            answers_created: AtomicUsize::new(0),
            local_descriptions_set: AtomicUsize::new(0),
            remote_descriptions_set: AtomicUsize::new(0),
            candidates_added: AtomicUsize::new(0),
            tracks_attached: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            fail_create_offer: AtomicBool::new(false),
        }
    }

    /// Sender for injecting peer events (remote track arrival, local
    /// candidates) from a test.
    pub fn event_sender(&self) -> mpsc::Sender<PeerEvent> {
        self.events_tx.clone()
    }

    pub fn set_fail_create_offer(&self, fail: bool) {
        self.fail_create_offer.store(fail, Ordering::SeqCst);
    }

    pub fn offers_created(&self) -> usize {
        self.offers_created.load(Ordering::SeqCst)
    }

    pub fn answers_created(&self) -> usize {
        self.answers_created.load(Ordering::SeqCst)
    }

    pub fn remote_descriptions_set(&self) -> usize {
        self.remote_descriptions_set.load(Ordering::SeqCst)
    }

    pub fn candidates_added(&self) -> usize {
        self.candidates_added.load(Ordering::SeqCst)
    }

    pub fn tracks_attached(&self) -> usize {
        self.tracks_attached.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn guard_open(&self) -> Result<(), CirclewError> {
        if self.is_closed() {
            return Err(CirclewError::PeerConnectionClosed);
        }
        Ok(())
    }
}

impl Default for MockPeerConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeerConnection for MockPeerConnection {
    async fn attach_tracks(&self, media: &dyn LocalMedia) -> Result<(), CirclewError> {
        self.guard_open()?;
        self.tracks_attached
            .fetch_add(media.track_count(), Ordering::SeqCst);
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, CirclewError> {
        self.guard_open()?;
        if self.fail_create_offer.load(Ordering::SeqCst) {
            return Err(CirclewError::PeerConnection("injected offer failure".into()));
        }
        let n = self.offers_created.fetch_add(1, Ordering::SeqCst);
        Ok(SessionDescription {
            kind: SdpKind::Offer,
            sdp: format!("v=0 mock-offer-{n}"),
        })
    }

    async fn create_answer(&self) -> Result<SessionDescription, CirclewError> {
        self.guard_open()?;
        let n = self.answers_created.fetch_add(1, Ordering::SeqCst);
        Ok(SessionDescription {
            kind: SdpKind::Answer,
            sdp: format!("v=0 mock-answer-{n}"),
        })
    }

    async fn set_local_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), CirclewError> {
        self.guard_open()?;
        let mut state = self.state.lock().expect("state lock poisoned");
        *state = match (*state, desc.kind) {
            (SignalingState::Stable, SdpKind::Offer) => SignalingState::HaveLocalOffer,
            (SignalingState::HaveRemoteOffer, SdpKind::Answer) => SignalingState::Stable,
            (from, kind) => {
                return Err(CirclewError::PeerConnection(format!(
                    "cannot set local {kind:?} in state {from:?}"
                )));
            }
        };
        self.local_descriptions_set.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), CirclewError> {
        self.guard_open()?;
        let mut state = self.state.lock().expect("state lock poisoned");
        *state = match (*state, desc.kind) {
            (SignalingState::Stable, SdpKind::Offer) => SignalingState::HaveRemoteOffer,
            (SignalingState::HaveLocalOffer, SdpKind::Answer) => SignalingState::Stable,
            (from, kind) => {
                return Err(CirclewError::PeerConnection(format!(
                    "cannot set remote {kind:?} in state {from:?}"
                )));
            }
        };
        self.remote_descriptions_set.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add_ice_candidate(&self, _candidate: IceCandidate) -> Result<(), CirclewError> {
        self.guard_open()?;
        self.candidates_added.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn signaling_state(&self) -> SignalingState {
        if self.is_closed() {
            return SignalingState::Closed;
        }
        *self.state.lock().expect("state lock poisoned")
    }

    fn take_events(&self) -> Option<mpsc::Receiver<PeerEvent>> {
        self.events_rx.lock().expect("events lock poisoned").take()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Mock local media tracks. Cloneable so tests can keep a handle after the
/// call machine takes ownership.
#[derive(Clone)]
pub struct MockMedia {
    stopped: Arc<AtomicBool>,
    tracks: usize,
}

impl MockMedia {
    pub fn new(tracks: usize) -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            tracks,
        }
    }
}

impl LocalMedia for MockMedia {
    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn track_count(&self) -> usize {
        if self.is_stopped() {
            0
        } else {
            self.tracks
        }
    }
}

/// Mock media source. Keeps a handle to every acquired media set so tests can
/// assert tracks were released on teardown.
pub struct MockMediaSource {
    fail_acquire: AtomicBool,
    acquired: Mutex<Vec<MockMedia>>,
}

impl MockMediaSource {
    pub fn new() -> Self {
        Self {
            fail_acquire: AtomicBool::new(false),
            acquired: Mutex::new(Vec::new()),
        }
    }

    pub fn set_fail_acquire(&self, fail: bool) {
        self.fail_acquire.store(fail, Ordering::SeqCst);
    }

    /// Handles to every media set handed out so far.
    pub async fn acquired(&self) -> Vec<MockMedia> {
        self.acquired.lock().await.clone()
    }
}

impl Default for MockMediaSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for MockMediaSource {
    async fn acquire(&self) -> Result<Box<dyn LocalMedia>, CirclewError> {
        if self.fail_acquire.load(Ordering::SeqCst) {
            return Err(CirclewError::Media("permission denied".into()));
        }
        let media = MockMedia::new(2); // one audio + one video track
        self.acquired.lock().await.push(media.clone());
        Ok(Box::new(media))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remote_offer_then_local_answer_returns_to_stable() {
        let pc = MockPeerConnection::new();
        pc.set_remote_description(SessionDescription {
            kind: SdpKind::Offer,
            sdp: "o".into(),
        })
        .await
        .unwrap();
        assert_eq!(pc.signaling_state(), SignalingState::HaveRemoteOffer);

        let answer = pc.create_answer().await.unwrap();
        pc.set_local_description(answer).await.unwrap();
        assert_eq!(pc.signaling_state(), SignalingState::Stable);
    }

    #[tokio::test]
    async fn duplicate_remote_offer_is_a_state_error() {
        let pc = MockPeerConnection::new();
        let offer = SessionDescription {
            kind: SdpKind::Offer,
            sdp: "o".into(),
        };
        pc.set_remote_description(offer.clone()).await.unwrap();
        assert!(pc.set_remote_description(offer).await.is_err());
    }

    #[tokio::test]
    async fn closed_connection_rejects_candidates() {
        let pc = MockPeerConnection::new();
        pc.close();
        let result = pc
            .add_ice_candidate(IceCandidate {
                candidate: "candidate:0".into(),
                sdp_mid: None,
                sdp_mline_index: None,
            })
            .await;
        assert!(matches!(result, Err(CirclewError::PeerConnectionClosed)));
    }

    #[tokio::test]
    async fn media_stop_is_idempotent_and_releases_tracks() {
        let media = MockMedia::new(2);
        assert_eq!(media.track_count(), 2);
        media.stop();
        media.stop();
        assert!(media.is_stopped());
        assert_eq!(media.track_count(), 0);
    }
}
