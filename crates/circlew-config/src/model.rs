// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for CircleW.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level CircleW configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CirclewConfig {
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Recurring-meetup scheduling settings.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// 1:1 call setup settings.
    #[serde(default)]
    pub call: CallConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Recurring-meetup scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// How many upcoming occurrences to keep materialized per circle.
    #[serde(default = "default_upcoming_count")]
    pub upcoming_count: usize,

    /// Width in days of the window used when reconciling near-duplicate
    /// occurrences around the next meetup.
    #[serde(default = "default_reconcile_window_days")]
    pub reconcile_window_days: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            upcoming_count: default_upcoming_count(),
            reconcile_window_days: default_reconcile_window_days(),
        }
    }
}

/// 1:1 call setup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CallConfig {
    /// Signaling poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// STUN server URLs handed to the peer connection.
    #[serde(default = "default_stun_servers")]
    pub stun_servers: Vec<String>,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            stun_servers: default_stun_servers(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("circlew/circlew.db").to_string_lossy().into_owned())
        .unwrap_or_else(|| "circlew.db".to_string())
}

fn default_upcoming_count() -> usize {
    4
}

fn default_reconcile_window_days() -> u64 {
    3
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_stun_servers() -> Vec<String> {
    vec!["stun:stun.l.google.com:19302".to_string()]
}
