// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-peer call-setup state machine.
//!
//! One `CallSetup` instance owns one call attempt end to end: local media,
//! the peer connection, and the polling loop over the signaling channel.
//! Exactly one poll tick executes at a time; ticks never overlap. Because
//! the channel has no ack, a signal processed in one tick is fetched again
//! in the next -- every handler is idempotent under redelivery, guarded by
//! the connection's signaling state rather than by luck.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use circlew_core::error::CirclewError;
use circlew_core::traits::{LocalMedia, MediaSource, PeerConnection, SignalChannel};
use circlew_core::types::{
    CallRoom, IceCandidate, PeerEvent, SdpKind, SessionDescription, SignalKind, SignalMessage,
    SignalingState,
};

use crate::role::{resolve_role, CallRole};
use crate::state::CallPhase;

/// Drives one 1:1 call attempt from idle to connected.
///
/// The local media stream is exclusively owned by this instance; starting a
/// new call while one is active requires tearing the old instance down first.
/// Teardown also runs on drop so an abandoned attempt never leaks an open
/// camera or a dangling poll loop.
pub struct CallSetup {
    user_id: String,
    room: CallRoom,
    role: CallRole,
    channel: Arc<dyn SignalChannel>,
    pc: Arc<dyn PeerConnection>,
    media_source: Arc<dyn MediaSource>,
    media: Option<Box<dyn LocalMedia>>,
    events: Option<mpsc::Receiver<PeerEvent>>,
    phase: CallPhase,
    /// Set once the remote description is applied; the redelivery guard for
    /// offers/answers and the gate for flushing buffered candidates.
    remote_description_set: bool,
    /// Candidates that arrived before the remote description.
    pending_candidates: Vec<IceCandidate>,
    /// Signal ids already processed this call. An optimization only --
    /// correctness rests on the signaling-state guards.
    seen: HashSet<String>,
    cancel: CancellationToken,
    poll_interval: Duration,
    ended: bool,
}

impl CallSetup {
    pub fn new(
        user_id: impl Into<String>,
        room: CallRoom,
        channel: Arc<dyn SignalChannel>,
        pc: Arc<dyn PeerConnection>,
        media_source: Arc<dyn MediaSource>,
        poll_interval: Duration,
    ) -> Self {
        let user_id = user_id.into();
        let role = resolve_role(&user_id, &room);
        Self {
            user_id,
            room,
            role,
            channel,
            pc,
            media_source,
            media: None,
            events: None,
            phase: CallPhase::Idle,
            remote_description_set: false,
            pending_candidates: Vec::new(),
            seen: HashSet::new(),
            cancel: CancellationToken::new(),
            poll_interval,
            ended: false,
        }
    }

    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    pub fn role(&self) -> CallRole {
        self.role
    }

    /// Token cancelled on teardown. Cloneable by the surrounding UI so it can
    /// cancel the polling loop from outside.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Acquire media, build the connection, and (for the caller) send the
    /// offer. On any failure the attempt is fully torn down -- tracks
    /// stopped, connection closed -- before the error is returned.
    pub async fn start(&mut self) -> Result<(), CirclewError> {
        if self.phase != CallPhase::Idle || self.ended {
            return Err(CirclewError::Internal(
                "call setup already started or ended".into(),
            ));
        }

        self.phase = CallPhase::AcquiringMedia;
        let media = match self.media_source.acquire().await {
            Ok(media) => media,
            Err(err) => {
                // acquire() releases partial tracks itself; nothing else to
                // clean up yet.
                self.phase = CallPhase::Failed;
                self.ended = true;
                return Err(err);
            }
        };

        self.phase = CallPhase::CreatingConnection;
        if let Err(err) = self.pc.attach_tracks(&*media).await {
            media.stop();
            self.abort();
            return Err(err);
        }
        self.media = Some(media);
        self.events = self.pc.take_events();

        match self.role {
            CallRole::Caller => {
                self.phase = CallPhase::Offering;
                if let Err(err) = self.send_offer().await {
                    self.abort();
                    return Err(err);
                }
                debug!(room_id = %self.room.room_id, "offer sent; awaiting answer");
            }
            CallRole::Answerer => {
                self.phase = CallPhase::AwaitingOffer;
                debug!(room_id = %self.room.room_id, "awaiting remote offer");
            }
        }
        Ok(())
    }

    /// Run the polling loop until the call is torn down or fails.
    ///
    /// One tick at a time: a tick that runs long delays the next rather than
    /// overlapping it. Cancellation (via [`end`](Self::end) or the token)
    /// stops the loop synchronously; no signal is processed after teardown.
    pub async fn run(&mut self) {
        let cancel = self.cancel.clone();
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // Held outside `self` for the life of the loop so peer events can be
        // awaited alongside the poll timer.
        let mut events = self.events.take();

        loop {
            if self.phase.is_terminal() || cancel.is_cancelled() {
                break;
            }
            let next_event = async {
                match events.as_mut() {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe_event = next_event => {
                    match maybe_event {
                        Some(event) => self.handle_peer_event(event).await,
                        None => events = None,
                    }
                }
                _ = interval.tick() => {
                    if let Err(err) = self.poll_once().await {
                        warn!(error = %err, "poll tick failed; continuing");
                    }
                }
            }
        }
        self.events = events;
    }

    /// Execute one poll tick: drain pending peer events, then fetch and
    /// dispatch the other peer's signals in `created_at` order.
    ///
    /// A failure while processing one signal is logged and does not stop the
    /// remaining signals in the tick, nor the loop.
    pub async fn poll_once(&mut self) -> Result<(), CirclewError> {
        if self.phase == CallPhase::Idle || self.phase.is_terminal() || self.cancel.is_cancelled()
        {
            return Ok(());
        }

        self.drain_peer_events().await;

        let signals = match self
            .channel
            .fetch_room(&self.room.room_id, &self.user_id)
            .await
        {
            Ok(signals) => signals,
            Err(err) => {
                // Transient fetch failures just wait for the next tick.
                warn!(error = %err, room_id = %self.room.room_id, "signal fetch failed");
                return Ok(());
            }
        };

        for signal in signals {
            if !self.seen.insert(signal.id.clone()) {
                continue;
            }
            if let Err(err) = self.handle_signal(&signal).await {
                warn!(
                    kind = %signal.kind,
                    signal_id = %signal.id,
                    error = %err,
                    "failed to process signal; continuing"
                );
            }
        }
        Ok(())
    }

    /// Tear down the call: stop local tracks, cancel polling, close the
    /// connection. Idempotent; safe before `start` has completed and safe to
    /// call twice.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.cancel.cancel();
        if let Some(media) = self.media.take() {
            media.stop();
        }
        self.pc.close();
        if self.phase != CallPhase::Failed {
            self.phase = CallPhase::Ended;
        }
        debug!(room_id = %self.room.room_id, "call torn down");
    }

    /// Teardown for setup failures: like [`end`](Self::end) but lands in
    /// `Failed`.
    fn abort(&mut self) {
        self.ended = true;
        self.cancel.cancel();
        if let Some(media) = self.media.take() {
            media.stop();
        }
        self.pc.close();
        self.phase = CallPhase::Failed;
    }

    async fn send_offer(&mut self) -> Result<(), CirclewError> {
        let offer = self.pc.create_offer().await?;
        self.pc.set_local_description(offer.clone()).await?;
        self.append_signal(SignalKind::Offer, offer.sdp).await
    }

    async fn append_signal(&self, kind: SignalKind, payload: String) -> Result<(), CirclewError> {
        let msg = SignalMessage {
            id: Uuid::new_v4().to_string(),
            room_id: self.room.room_id.clone(),
            kind,
            payload,
            sender_id: self.user_id.clone(),
            created_at: Utc::now(),
        };
        self.channel.append(&msg).await
    }

    async fn drain_peer_events(&mut self) {
        let mut drained = Vec::new();
        if let Some(events) = self.events.as_mut() {
            while let Ok(event) = events.try_recv() {
                drained.push(event);
            }
        }
        for event in drained {
            self.handle_peer_event(event).await;
        }
    }

    async fn handle_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::LocalCandidate(candidate) => {
                let payload = match serde_json::to_string(&candidate) {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!(error = %err, "failed to serialize local candidate");
                        return;
                    }
                };
                if let Err(err) = self.append_signal(SignalKind::IceCandidate, payload).await {
                    warn!(error = %err, "failed to relay local candidate");
                }
            }
            PeerEvent::RemoteTrack { track_id } => {
                if !self.phase.is_terminal() {
                    info!(%track_id, room_id = %self.room.room_id, "remote track arrived");
                    self.phase = CallPhase::Connected;
                }
            }
            PeerEvent::ConnectionFailed { reason } => {
                warn!(%reason, room_id = %self.room.room_id, "peer connection failed");
                self.phase = CallPhase::Failed;
            }
        }
    }

    async fn handle_signal(&mut self, signal: &SignalMessage) -> Result<(), CirclewError> {
        match signal.kind {
            SignalKind::Offer => self.handle_offer(signal).await,
            SignalKind::Answer => self.handle_answer(signal).await,
            SignalKind::IceCandidate => self.handle_candidate(signal).await,
        }
    }

    /// Apply a remote offer and send back the answer. Answerer only; a
    /// redelivered or out-of-state offer is skipped, not re-applied.
    async fn handle_offer(&mut self, signal: &SignalMessage) -> Result<(), CirclewError> {
        if self.role != CallRole::Answerer {
            debug!("ignoring offer: this peer is the caller");
            return Ok(());
        }
        if self.remote_description_set
            || self.pc.signaling_state() != SignalingState::Stable
        {
            debug!(signal_id = %signal.id, "offer already applied; skipping redelivery");
            return Ok(());
        }

        self.pc
            .set_remote_description(SessionDescription {
                kind: SdpKind::Offer,
                sdp: signal.payload.clone(),
            })
            .await?;
        self.remote_description_set = true;
        self.flush_pending_candidates().await;

        let answer = self.pc.create_answer().await?;
        self.pc.set_local_description(answer.clone()).await?;
        self.append_signal(SignalKind::Answer, answer.sdp).await?;
        self.phase = CallPhase::Negotiating;
        Ok(())
    }

    /// Apply the remote answer. Caller only; valid only while a local offer
    /// is outstanding.
    async fn handle_answer(&mut self, signal: &SignalMessage) -> Result<(), CirclewError> {
        if self.role != CallRole::Caller {
            debug!("ignoring answer: this peer is the answerer");
            return Ok(());
        }
        if self.remote_description_set
            || self.pc.signaling_state() != SignalingState::HaveLocalOffer
        {
            debug!(signal_id = %signal.id, "answer already applied; skipping redelivery");
            return Ok(());
        }

        self.pc
            .set_remote_description(SessionDescription {
                kind: SdpKind::Answer,
                sdp: signal.payload.clone(),
            })
            .await?;
        self.remote_description_set = true;
        self.flush_pending_candidates().await;
        self.phase = CallPhase::Negotiating;
        Ok(())
    }

    /// Add (or buffer) a remote ICE candidate. Candidates can arrive before
    /// the remote description; they are held until it lands, then flushed in
    /// arrival order. A closed connection makes this a no-op.
    async fn handle_candidate(&mut self, signal: &SignalMessage) -> Result<(), CirclewError> {
        if self.pc.signaling_state() == SignalingState::Closed {
            return Ok(());
        }
        let candidate: IceCandidate =
            serde_json::from_str(&signal.payload).map_err(|err| CirclewError::Signal {
                message: format!("malformed ice candidate payload in signal {}", signal.id),
                source: Some(Box::new(err)),
            })?;

        if !self.remote_description_set {
            self.pending_candidates.push(candidate);
            debug!(
                buffered = self.pending_candidates.len(),
                "candidate arrived before remote description; buffered"
            );
            return Ok(());
        }
        self.pc.add_ice_candidate(candidate).await
    }

    async fn flush_pending_candidates(&mut self) {
        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(err) = self.pc.add_ice_candidate(candidate).await {
                warn!(error = %err, "failed to add buffered candidate");
            }
        }
    }
}

impl Drop for CallSetup {
    fn drop(&mut self) {
        // Resource safety on unmount: never leak an open camera or a live
        // poll loop, even if the owner forgot to end the call.
        if !self.ended {
            self.end();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circlew_test_utils::{MemorySignalChannel, MockMediaSource, MockPeerConnection};

    const CALLER: &str = "user-a";
    const ANSWERER: &str = "user-b";
    const ROOM: &str = "meetup-42";

    struct Harness {
        channel: Arc<MemorySignalChannel>,
        pc: Arc<MockPeerConnection>,
        media: Arc<MockMediaSource>,
        machine: CallSetup,
    }

    fn harness(user_id: &str) -> Harness {
        let channel = Arc::new(MemorySignalChannel::new());
        let pc = Arc::new(MockPeerConnection::new());
        let media = Arc::new(MockMediaSource::new());
        let machine = CallSetup::new(
            user_id,
            CallRoom {
                room_id: ROOM.into(),
                requester_id: CALLER.into(),
            },
            channel.clone(),
            pc.clone(),
            media.clone(),
            Duration::from_millis(10),
        );
        Harness {
            channel,
            pc,
            media,
            machine,
        }
    }

    fn candidate_json(n: u32) -> String {
        serde_json::to_string(&IceCandidate {
            candidate: format!("candidate:{n} 1 udp 2122260223 192.0.2.{n} 54400 typ host"),
            sdp_mid: Some("0".into()),
            sdp_mline_index: Some(0),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn caller_sends_exactly_one_offer_on_start() {
        let mut h = harness(CALLER);
        h.machine.start().await.unwrap();

        assert_eq!(h.machine.role(), CallRole::Caller);
        assert_eq!(h.machine.phase(), CallPhase::Offering);
        assert_eq!(h.channel.count_from(CALLER, SignalKind::Offer).await, 1);
        // Tracks must be attached before signaling.
        assert_eq!(h.pc.tracks_attached(), 2);
    }

    #[tokio::test]
    async fn answerer_sends_nothing_on_start() {
        let mut h = harness(ANSWERER);
        h.machine.start().await.unwrap();

        assert_eq!(h.machine.phase(), CallPhase::AwaitingOffer);
        assert!(h.channel.all_messages().await.is_empty());
    }

    #[tokio::test]
    async fn answerer_applies_offer_and_answers_once() {
        let mut h = harness(ANSWERER);
        h.machine.start().await.unwrap();

        h.channel
            .push(ROOM, SignalKind::Offer, "v=0 remote-offer", CALLER)
            .await;
        h.machine.poll_once().await.unwrap();

        assert_eq!(h.pc.remote_descriptions_set(), 1);
        assert_eq!(h.pc.answers_created(), 1);
        assert_eq!(h.channel.count_from(ANSWERER, SignalKind::Answer).await, 1);
        assert_eq!(h.machine.phase(), CallPhase::Negotiating);
    }

    #[tokio::test]
    async fn redelivered_offer_is_skipped_not_reapplied() {
        let mut h = harness(ANSWERER);
        h.machine.start().await.unwrap();

        // The sender re-sent the offer: two distinct rows, same SDP. The
        // seen-set cannot help here; the state guard must.
        h.channel
            .push(ROOM, SignalKind::Offer, "v=0 remote-offer", CALLER)
            .await;
        h.channel
            .push(ROOM, SignalKind::Offer, "v=0 remote-offer", CALLER)
            .await;
        h.machine.poll_once().await.unwrap();
        // And the full history is fetched again next tick.
        h.machine.poll_once().await.unwrap();

        assert_eq!(h.pc.remote_descriptions_set(), 1, "one setRemoteDescription");
        assert_eq!(h.pc.answers_created(), 1, "one answer created");
        assert_eq!(
            h.channel.count_from(ANSWERER, SignalKind::Answer).await,
            1,
            "one answer sent"
        );
    }

    #[tokio::test]
    async fn caller_applies_answer_exactly_once() {
        let mut h = harness(CALLER);
        h.machine.start().await.unwrap();

        h.channel
            .push(ROOM, SignalKind::Answer, "v=0 remote-answer", ANSWERER)
            .await;
        h.machine.poll_once().await.unwrap();
        assert_eq!(h.pc.remote_descriptions_set(), 1);
        assert_eq!(h.machine.phase(), CallPhase::Negotiating);

        // Redelivery with a fresh row id.
        h.channel
            .push(ROOM, SignalKind::Answer, "v=0 remote-answer", ANSWERER)
            .await;
        h.machine.poll_once().await.unwrap();
        assert_eq!(h.pc.remote_descriptions_set(), 1);
    }

    #[tokio::test]
    async fn candidates_before_remote_description_are_buffered_then_flushed() {
        let mut h = harness(ANSWERER);
        h.machine.start().await.unwrap();

        h.channel
            .push(ROOM, SignalKind::IceCandidate, &candidate_json(1), CALLER)
            .await;
        h.channel
            .push(ROOM, SignalKind::IceCandidate, &candidate_json(2), CALLER)
            .await;
        h.machine.poll_once().await.unwrap();
        assert_eq!(h.pc.candidates_added(), 0, "no remote description yet");

        h.channel
            .push(ROOM, SignalKind::Offer, "v=0 remote-offer", CALLER)
            .await;
        h.machine.poll_once().await.unwrap();

        assert_eq!(h.pc.candidates_added(), 2, "buffer flushed after offer");
    }

    #[tokio::test]
    async fn candidates_after_remote_description_apply_directly() {
        let mut h = harness(ANSWERER);
        h.machine.start().await.unwrap();

        h.channel
            .push(ROOM, SignalKind::Offer, "v=0 remote-offer", CALLER)
            .await;
        h.machine.poll_once().await.unwrap();

        h.channel
            .push(ROOM, SignalKind::IceCandidate, &candidate_json(1), CALLER)
            .await;
        h.machine.poll_once().await.unwrap();
        assert_eq!(h.pc.candidates_added(), 1);
    }

    #[tokio::test]
    async fn malformed_signal_does_not_stop_later_signals_in_the_tick() {
        let mut h = harness(ANSWERER);
        h.machine.start().await.unwrap();

        h.channel
            .push(ROOM, SignalKind::IceCandidate, "not json", CALLER)
            .await;
        h.channel
            .push(ROOM, SignalKind::Offer, "v=0 remote-offer", CALLER)
            .await;
        h.machine.poll_once().await.unwrap();

        // The bad candidate was logged and skipped; the offer still landed.
        assert_eq!(h.pc.remote_descriptions_set(), 1);
        assert_eq!(h.channel.count_from(ANSWERER, SignalKind::Answer).await, 1);
    }

    #[tokio::test]
    async fn local_candidates_are_relayed_through_the_channel() {
        let mut h = harness(CALLER);
        h.machine.start().await.unwrap();

        h.pc
            .event_sender()
            .send(PeerEvent::LocalCandidate(IceCandidate {
                candidate: "candidate:7 1 udp 1 192.0.2.7 54400 typ host".into(),
                sdp_mid: Some("0".into()),
                sdp_mline_index: Some(0),
            }))
            .await
            .unwrap();
        h.machine.poll_once().await.unwrap();

        assert_eq!(
            h.channel.count_from(CALLER, SignalKind::IceCandidate).await,
            1
        );
    }

    #[tokio::test]
    async fn remote_track_marks_the_call_connected() {
        let mut h = harness(CALLER);
        h.machine.start().await.unwrap();

        h.pc
            .event_sender()
            .send(PeerEvent::RemoteTrack {
                track_id: "video-0".into(),
            })
            .await
            .unwrap();
        h.machine.poll_once().await.unwrap();

        assert_eq!(h.machine.phase(), CallPhase::Connected);
    }

    #[tokio::test]
    async fn media_failure_is_fatal_and_sends_nothing() {
        let mut h = harness(CALLER);
        h.media.set_fail_acquire(true);

        let result = h.machine.start().await;
        assert!(matches!(result, Err(CirclewError::Media(_))));
        assert_eq!(h.machine.phase(), CallPhase::Failed);
        assert!(h.channel.all_messages().await.is_empty());
    }

    #[tokio::test]
    async fn offer_failure_tears_the_attempt_down() {
        let mut h = harness(CALLER);
        h.pc.set_fail_create_offer(true);

        let result = h.machine.start().await;
        assert!(result.is_err());
        assert_eq!(h.machine.phase(), CallPhase::Failed);
        assert!(h.pc.is_closed());
        let acquired = h.media.acquired().await;
        assert_eq!(acquired.len(), 1);
        assert!(acquired[0].is_stopped(), "tracks released on setup failure");
    }

    #[tokio::test]
    async fn end_is_idempotent_and_safe_before_start() {
        let mut h = harness(CALLER);
        // Before start: nothing to release, must not panic.
        h.machine.end();
        h.machine.end();
        assert_eq!(h.machine.phase(), CallPhase::Ended);
        assert!(h.machine.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn end_after_start_releases_every_resource_once() {
        let mut h = harness(CALLER);
        h.machine.start().await.unwrap();

        h.machine.end();
        h.machine.end();

        assert_eq!(h.machine.phase(), CallPhase::Ended);
        assert!(h.pc.is_closed());
        let acquired = h.media.acquired().await;
        assert_eq!(acquired.len(), 1);
        assert!(acquired[0].is_stopped());
        assert_eq!(acquired[0].track_count(), 0, "zero live tracks");
        assert!(h.machine.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn no_signal_is_processed_after_teardown() {
        let mut h = harness(ANSWERER);
        h.machine.start().await.unwrap();
        h.machine.end();

        h.channel
            .push(ROOM, SignalKind::Offer, "v=0 late-offer", CALLER)
            .await;
        h.machine.poll_once().await.unwrap();

        assert_eq!(h.pc.remote_descriptions_set(), 0);
        assert_eq!(h.channel.count_from(ANSWERER, SignalKind::Answer).await, 0);
    }

    #[tokio::test]
    async fn drop_releases_media_and_closes_the_connection() {
        let h = {
            let mut h = harness(CALLER);
            h.machine.start().await.unwrap();
            h
        };
        let pc = h.pc.clone();
        let media = h.media.clone();
        drop(h);

        assert!(pc.is_closed());
        let acquired = media.acquired().await;
        assert!(acquired[0].is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_stops_synchronously_on_cancellation() {
        let mut h = harness(ANSWERER);
        h.machine.start().await.unwrap();
        let cancel = h.machine.cancellation_token();

        let run = h.machine.run();
        tokio::pin!(run);
        tokio::select! {
            _ = &mut run => panic!("run returned before cancellation"),
            _ = tokio::time::sleep(Duration::from_millis(35)) => cancel.cancel(),
        }
        // Must return promptly once cancelled.
        run.await;
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_processes_signals_on_ticks() {
        let mut h = harness(ANSWERER);
        h.machine.start().await.unwrap();
        h.channel
            .push(ROOM, SignalKind::Offer, "v=0 remote-offer", CALLER)
            .await;

        let cancel = h.machine.cancellation_token();
        let run = h.machine.run();
        tokio::pin!(run);
        tokio::select! {
            _ = &mut run => panic!("run returned early"),
            _ = tokio::time::sleep(Duration::from_millis(35)) => cancel.cancel(),
        }
        run.await;

        assert_eq!(h.pc.remote_descriptions_set(), 1);
        assert_eq!(h.channel.count_from(ANSWERER, SignalKind::Answer).await, 1);
    }
}
