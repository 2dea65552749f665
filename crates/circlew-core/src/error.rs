// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the CircleW meetup core.

use thiserror::Error;

/// The primary error type used across collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum CirclewError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The storage schema lacks a column the core expects. Consumers degrade
    /// to computed-only output instead of failing outright.
    #[error("storage schema missing column {column} on {table}")]
    SchemaMismatch { table: String, column: String },

    /// Signaling channel errors (append failure, malformed signal payload).
    #[error("signal channel error: {message}")]
    Signal {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Local media acquisition failed (permission denied, device unavailable).
    /// Fatal to the call attempt; the user must re-initiate.
    #[error("media acquisition failed: {0}")]
    Media(String),

    /// Peer connection errors (SDP generation, description application).
    #[error("peer connection error: {0}")]
    PeerConnection(String),

    /// An operation was attempted on a closed peer connection.
    #[error("peer connection is closed")]
    PeerConnectionClosed,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_mismatch_names_table_and_column() {
        let err = CirclewError::SchemaMismatch {
            table: "meetups".into(),
            column: "circle_id".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("meetups"));
        assert!(msg.contains("circle_id"));
    }

    #[test]
    fn all_variants_construct() {
        let _config = CirclewError::Config("test".into());
        let _storage = CirclewError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _signal = CirclewError::Signal {
            message: "test".into(),
            source: None,
        };
        let _media = CirclewError::Media("denied".into());
        let _pc = CirclewError::PeerConnection("sdp".into());
        let _closed = CirclewError::PeerConnectionClosed;
        let _internal = CirclewError::Internal("test".into());
    }
}
