// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for CircleW.
//!
//! TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, and environment variable overrides.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::CirclewConfig;

use circlew_core::error::CirclewError;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<CirclewConfig, CirclewError> {
    let config = loader::load_config().map_err(|e| CirclewError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}
