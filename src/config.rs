//! Auto-save configuration.
//!
//! A single debounce window applies to every draft kind. Values can be read
//! from JSON and overridden from the environment.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default quiet period after the last edit before a save is attempted.
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

/// Shown when a failed save carries no presentable message.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Failed to save changes";

/// Environment variable overriding [`AutosaveConfig::debounce_ms`].
pub const DEBOUNCE_ENV_VAR: &str = "ITINERARY_AUTOSAVE_DEBOUNCE_MS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Debounce window in milliseconds. Must be non-zero.
    pub debounce_ms: u64,

    /// Notification text used when the server error has no message.
    pub failure_fallback_message: String,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            failure_fallback_message: DEFAULT_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl AutosaveConfig {
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Parse and validate a JSON document. Missing keys take their defaults.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ITINERARY_AUTOSAVE_DEBOUNCE_MS` when it is set.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup(DEBOUNCE_ENV_VAR) {
            self.debounce_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: DEBOUNCE_ENV_VAR.to_string(),
                value: raw.clone(),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        Ok(())
    }
}
