// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.

use circlew_core::error::CirclewError;

use crate::model::CirclewConfig;

/// Validate cross-field constraints Figment cannot express.
pub fn validate_config(config: &CirclewConfig) -> Result<(), CirclewError> {
    if config.storage.database_path.is_empty() {
        return Err(CirclewError::Config(
            "storage.database_path must not be empty".into(),
        ));
    }
    if config.schedule.upcoming_count == 0 {
        return Err(CirclewError::Config(
            "schedule.upcoming_count must be at least 1".into(),
        ));
    }
    if config.call.poll_interval_ms == 0 {
        return Err(CirclewError::Config(
            "call.poll_interval_ms must be at least 1".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&CirclewConfig::default()).is_ok());
    }

    #[test]
    fn zero_upcoming_count_is_rejected() {
        let mut config = CirclewConfig::default();
        config.schedule.upcoming_count = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("upcoming_count"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut config = CirclewConfig::default();
        config.call.poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn empty_database_path_is_rejected() {
        let mut config = CirclewConfig::default();
        config.storage.database_path = String::new();
        assert!(validate_config(&config).is_err());
    }
}
