// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the CircleW core.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Cadence of a circle's recurring meetup.
///
/// Stored as free text in the circle row; anything unrecognized (including
/// "As needed") falls into [`Cadence::Other`] and steps like [`Cadence::Weekly`].
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum Cadence {
    Weekly,
    Biweekly,
    Monthly,
    /// First and third occurrence of the weekday in each calendar month.
    #[strum(serialize = "1st & 3rd")]
    FirstAndThird,
    /// Free-text cadence with no fixed step of its own.
    #[strum(default, to_string = "{0}")]
    Other(String),
}

/// A circle's recurrence rule: which weekday it meets on and how often.
///
/// A circle whose meeting day is "Flexible" (or unset) has no recurrence;
/// its rule produces zero occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// `None` means no recurrence ("Flexible" or absent meeting day).
    pub weekday: Option<Weekday>,
    pub cadence: Cadence,
}

impl RecurrenceRule {
    /// Build a rule from the raw stored circle fields.
    ///
    /// Weekday strings are full English day names ("Wednesday"); "Flexible"
    /// or anything unparseable yields a rule with no weekday. A missing
    /// cadence defaults to weekly.
    pub fn from_fields(meeting_day: Option<&str>, cadence: Option<&str>) -> Self {
        let weekday = meeting_day.and_then(|d| Weekday::from_str(d).ok());
        let cadence = cadence
            .map(|c| Cadence::from_str(c).unwrap_or_else(|_| Cadence::Other(c.to_string())))
            .unwrap_or(Cadence::Weekly);
        Self { weekday, cadence }
    }

    /// Whether this rule can produce occurrences at all.
    pub fn is_active(&self) -> bool {
        self.weekday.is_some()
    }
}

/// Lifecycle status of a meetup occurrence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum MeetupStatus {
    Scheduled,
    Cancelled,
    Completed,
}

/// One materialized meetup occurrence, persisted in the `meetups` table.
///
/// Descriptive fields are copied from the circle at creation time and are
/// independently editable afterwards -- they are never re-synced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetupOccurrence {
    pub id: String,
    pub circle_id: String,
    /// Calendar date of the meetup, local (never UTC-shifted).
    pub date: NaiveDate,
    pub time_of_day: Option<String>,
    pub location: Option<String>,
    pub topic: String,
    pub duration_minutes: Option<i64>,
    pub participant_limit: Option<i64>,
    pub description: Option<String>,
    pub vibe_category: Option<String>,
    pub status: MeetupStatus,
    /// Bumped whenever a human edits the row; used as the reconciliation
    /// tie-break between nearby occurrences.
    pub updated_at: DateTime<Utc>,
}

/// A circle (small recurring group) as stored in the `circles` table.
///
/// The recurrence fields are raw stored strings; once cleared to `None`
/// materialization stops until the host sets them again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub id: String,
    pub name: String,
    pub meeting_day: Option<String>,
    pub cadence: Option<String>,
    pub time_of_day: Option<String>,
    pub location: Option<String>,
    pub max_members: Option<i64>,
    pub description: Option<String>,
    pub vibe_category: Option<String>,
}

impl Circle {
    /// Parse the stored recurrence fields into a [`RecurrenceRule`].
    pub fn recurrence_rule(&self) -> RecurrenceRule {
        RecurrenceRule::from_fields(self.meeting_day.as_deref(), self.cadence.as_deref())
    }

    /// Descriptive defaults copied onto newly materialized occurrences.
    pub fn occurrence_defaults(&self) -> OccurrenceDefaults {
        OccurrenceDefaults {
            circle_name: self.name.clone(),
            time_of_day: self.time_of_day.clone(),
            location: self.location.clone(),
            participant_limit: self.max_members,
            description: self.description.clone(),
            vibe_category: self.vibe_category.clone(),
        }
    }
}

/// Defaults seeding a newly materialized occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceDefaults {
    pub circle_name: String,
    pub time_of_day: Option<String>,
    pub location: Option<String>,
    pub participant_limit: Option<i64>,
    pub description: Option<String>,
    pub vibe_category: Option<String>,
}

impl OccurrenceDefaults {
    /// Topic for an auto-created occurrence.
    pub fn default_topic(&self) -> String {
        format!("{} Meetup", self.circle_name)
    }
}

/// A 1:1 call room. The requester is the caller; everyone else answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRoom {
    pub room_id: String,
    pub requester_id: String,
}

/// Kind of a signaling message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// One row of the append-only signaling channel.
///
/// For a successful call exactly one offer and one answer exist per room and
/// answerer; ICE candidate rows are unbounded and unordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMessage {
    pub id: String,
    pub room_id: String,
    pub kind: SignalKind,
    /// SDP text for offers/answers, serialized candidate JSON for ICE.
    pub payload: String,
    pub sender_id: String,
    pub created_at: DateTime<Utc>,
}

/// Whether an SDP blob is an offer or an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// An SDP session description exchanged during call setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

/// An ICE candidate, as generated locally or received from the remote peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_mline_index: Option<u32>,
}

/// Signaling state of a peer connection, mirrored as an explicit enum so the
/// state machine never branches on opaque platform strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    /// No offer in flight (initial state, and again once negotiated).
    Stable,
    /// A local offer has been applied; awaiting the remote answer.
    HaveLocalOffer,
    /// A remote offer has been applied; a local answer is due.
    HaveRemoteOffer,
    Closed,
}

/// Events surfaced by a peer connection while a call is being established.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// A locally gathered ICE candidate, to be relayed through the channel.
    LocalCandidate(IceCandidate),
    /// A remote media track arrived; the call is observably connected.
    RemoteTrack { track_id: String },
    /// The underlying transport failed.
    ConnectionFailed { reason: String },
}
