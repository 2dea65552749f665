// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phases of the call-setup state machine.

/// Phases a call attempt moves through.
///
/// `Idle -> AcquiringMedia -> CreatingConnection -> {Offering | AwaitingOffer}
/// -> Negotiating -> Connected -> Ended`, with `Failed` reachable from any
/// non-terminal phase. `Connected` is observed via remote track arrival, not
/// signaled through the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    /// Not started.
    Idle,
    /// Prompting for and acquiring camera/microphone.
    AcquiringMedia,
    /// Building the peer connection and attaching local tracks.
    CreatingConnection,
    /// Caller only: offer sent, awaiting the answer.
    Offering,
    /// Answerer only: waiting for the remote offer.
    AwaitingOffer,
    /// Descriptions exchanged; ICE negotiation under way.
    Negotiating,
    /// A remote media track has arrived.
    Connected,
    /// Torn down cleanly.
    Ended,
    /// Setup or transport failure.
    Failed,
}

impl CallPhase {
    /// Terminal phases accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, CallPhase::Ended | CallPhase::Failed)
    }
}

impl std::fmt::Display for CallPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CallPhase::Idle => "idle",
            CallPhase::AcquiringMedia => "acquiring-media",
            CallPhase::CreatingConnection => "creating-connection",
            CallPhase::Offering => "offering",
            CallPhase::AwaitingOffer => "awaiting-offer",
            CallPhase::Negotiating => "negotiating",
            CallPhase::Connected => "connected",
            CallPhase::Ended => "ended",
            CallPhase::Failed => "failed",
        };
        write!(f, "{name}")
    }
}
