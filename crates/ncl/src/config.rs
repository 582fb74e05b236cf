// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Environment variable configuration.
//!
//! Reads runtime configuration from environment variables:
//!
//! - `NCL_DOMAIN_ID`: domain id (default: 0, or `ROS_DOMAIN_ID` if set)
//! - `NCL_SESSION_NAME`: overrides the session name passed by the caller
//! - `NCL_LOG_LEVEL`: logging level (default: "info")
//!
//! # Example
//!
//! ```bash
//! export NCL_DOMAIN_ID=42
//! export NCL_LOG_LEVEL=debug
//! ```

use std::env;

/// Environment variable names
pub const ENV_DOMAIN_ID: &str = "NCL_DOMAIN_ID";
pub const ENV_SESSION_NAME: &str = "NCL_SESSION_NAME";
pub const ENV_LOG_LEVEL: &str = "NCL_LOG_LEVEL";

/// ROS 2 environment variable for the domain id (fallback).
pub const ENV_ROS_DOMAIN_ID: &str = "ROS_DOMAIN_ID";

/// Runtime configuration from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Domain id (0-232).
    pub domain_id: u32,

    /// Session name override.
    pub session_name: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            domain_id: 0,
            session_name: None,
            log_level: "info".to_string(),
        }
    }
}

impl EnvConfig {
    /// Load configuration from environment variables.
    ///
    /// Priority for the domain id:
    /// 1. `NCL_DOMAIN_ID`
    /// 2. `ROS_DOMAIN_ID`
    /// 3. Default (0)
    #[must_use]
    pub fn from_env() -> Self {
        let domain_id = env::var(ENV_DOMAIN_ID)
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .or_else(|| {
                env::var(ENV_ROS_DOMAIN_ID)
                    .ok()
                    .and_then(|s| s.parse::<u32>().ok())
            })
            .unwrap_or(0);

        let session_name = env::var(ENV_SESSION_NAME).ok().filter(|s| !s.is_empty());

        let log_level = env::var(ENV_LOG_LEVEL)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "info".to_string());

        Self {
            domain_id,
            session_name,
            log_level,
        }
    }

    /// Check if any non-default configuration was provided.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.domain_id != 0 || self.session_name.is_some() || self.log_level != "info"
    }

    /// Export the configured log level through `RUST_LOG`, unless the caller
    /// already set one.
    pub fn apply_log_level(&self) {
        if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
            env::set_var("RUST_LOG", &self.log_level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EnvConfig::default();
        assert_eq!(config.domain_id, 0);
        assert!(config.session_name.is_none());
        assert_eq!(config.log_level, "info");
        assert!(!config.is_custom());
    }

    #[test]
    fn test_is_custom_flags_overrides() {
        let config = EnvConfig {
            domain_id: 3,
            ..EnvConfig::default()
        };
        assert!(config.is_custom());

        let config = EnvConfig {
            log_level: "debug".to_string(),
            ..EnvConfig::default()
        };
        assert!(config.is_custom());

        let config = EnvConfig {
            session_name: Some("robot_1".to_string()),
            ..EnvConfig::default()
        };
        assert!(config.is_custom());
    }
}
