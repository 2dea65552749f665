// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./circlew.toml` > `~/.config/circlew/circlew.toml`
//! > `/etc/circlew/circlew.toml` with environment variable overrides via the
//! `CIRCLEW_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CirclewConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/circlew/circlew.toml` (system-wide)
/// 3. `~/.config/circlew/circlew.toml` (user XDG config)
/// 4. `./circlew.toml` (local directory)
/// 5. `CIRCLEW_*` environment variables
pub fn load_config() -> Result<CirclewConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CirclewConfig::default()))
        .merge(Toml::file("/etc/circlew/circlew.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("circlew/circlew.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("circlew.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and embedded configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CirclewConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CirclewConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CirclewConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CirclewConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// key names stay unambiguous: `CIRCLEW_CALL_POLL_INTERVAL_MS` must map to
/// `call.poll_interval_ms`, not `call.poll.interval.ms`.
fn env_provider() -> Env {
    Env::prefixed("CIRCLEW_").map(|key| {
        // The mapper sees the raw (possibly uppercase) key; figment only
        // lowercases after mapping, so normalize before matching sections.
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = key_str
            .replacen("storage_", "storage.", 1)
            .replacen("schedule_", "schedule.", 1)
            .replacen("call_", "call.", 1);
        mapped.into()
    })
}
