//! Post-processing configuration
//!
//! Loaded from TOML by the CLI; library callers usually start from
//! `PostProcessConfig::new()` and adjust with the `with_*` builders.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for one `PostProcessor`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostProcessConfig {
    /// Attempt the single repair call when validation fails
    pub repair_enabled: bool,
    /// Upper bound on the repair call, in seconds
    pub repair_timeout_secs: u64,
    /// Remove a previously generated breakdown before validating
    pub strip_existing_breakdown: bool,
}

impl PostProcessConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With repair enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_repair(mut self, enabled: bool) -> Self {
        self.repair_enabled = enabled;
        self
    }

    /// With repair timeout, rounded up to whole seconds
    #[inline]
    #[must_use]
    pub fn with_repair_timeout(mut self, timeout: Duration) -> Self {
        self.repair_timeout_secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self
    }

    /// With stripping of an existing generated breakdown
    #[inline]
    #[must_use]
    pub fn with_strip_existing_breakdown(mut self, strip: bool) -> Self {
        self.strip_existing_breakdown = strip;
        self
    }

    /// Repair timeout as a `Duration`
    #[inline]
    #[must_use]
    pub fn repair_timeout(&self) -> Duration {
        Duration::from_secs(self.repair_timeout_secs)
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repair_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "repair_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml_str(&text)
    }
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            repair_enabled: true,
            repair_timeout_secs: 120,
            strip_existing_breakdown: true,
        }
    }
}
