//! Runtime configuration for the scheduler and its web server.

use std::path::Path;

use serde::Deserialize;

use crate::error::LoadError;

/// Knobs for the scheduling arithmetic.
///
/// Defaults reproduce the salon's fixed rules: staggered batches start 30
/// minutes apart and alternatives are probed hourly from 09:00 to 17:00.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulingPolicy {
    /// Offset between consecutive batches under the staggered strategy
    pub stagger_offset_minutes: u32,

    /// First candidate time probed when suggesting alternatives
    pub probe_start: String,

    /// Last candidate time probed (inclusive)
    pub probe_end: String,

    pub probe_step_minutes: u32,

    /// Maximum number of alternative slots returned by a capacity check
    pub max_alternatives: usize,

    /// Used for appointments whose service has no recorded duration
    pub default_service_duration: u32,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            stagger_offset_minutes: 30,
            probe_start: "09:00".to_string(),
            probe_end: "17:00".to_string(),
            probe_step_minutes: 60,
            max_alternatives: 3,
            default_service_duration: 60,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub admin_password: String,
    pub policy: SchedulingPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            admin_password: "admin123".to_string(),
            policy: SchedulingPolicy::default(),
        }
    }
}

impl Config {
    /// Builds a config from `PORT`, `ADMIN_PASSWORD` and `STAGGER_OFFSET_MINUTES`,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Reads a JSON config file, then applies the same environment overrides as `from_env`.
    ///
    /// Missing fields keep their defaults, so `{"policy": {"max_alternatives": 5}}`
    /// is a complete file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    fn load_with<P, F>(path: P, lookup: F) -> Result<Self, LoadError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        Ok(config.with_overrides(lookup))
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(password) = lookup("ADMIN_PASSWORD").filter(|p| !p.is_empty()) {
            self.admin_password = password;
        }
        if let Some(offset) = lookup("STAGGER_OFFSET_MINUTES")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
        {
            self.policy.stagger_offset_minutes = offset;
        }

        self
    }
}
