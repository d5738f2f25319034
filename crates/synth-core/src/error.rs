//! Error types for synthesis post-processing
//!
//! Provides error handling for:
//! - Calls to the external text-generation capability
//! - The single-shot attribution repair
//! - Configuration loading
//!
//! None of these cross the public `PostProcessor::process` boundary; they are
//! folded into the final status there.

use std::path::PathBuf;

/// Failures of the external generation capability
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// Provider rejected or failed the request
    #[error("generation request failed: {0}")]
    RequestFailed(String),

    /// Call did not finish in time
    #[error("generation timed out after {secs}s")]
    Timeout {
        /// Configured limit
        secs: u64,
    },

    /// Provider answered with nothing usable
    #[error("generation returned an empty response")]
    EmptyResponse,

    /// No capability is wired up
    #[error("generation capability unavailable: {0}")]
    Unavailable(String),
}

impl GenerationError {
    /// Whether the failure was a timeout
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Failures of the one-shot repair pass
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepairError {
    /// The single generation call failed
    #[error("repair call failed: {0}")]
    Generation(#[from] GenerationError),

    /// The corrected text still violates the attribution rules
    #[error("repaired text still fails validation ({} issue(s))", .errors.len())]
    StillInvalid {
        /// Validation errors of the repaired text
        errors: Vec<String>,
    },

    /// No generator configured, or repair switched off in config
    #[error("repair disabled or no generator configured")]
    Disabled,
}

impl RepairError {
    /// Validation errors left after repair, if that was the failure
    #[must_use]
    pub fn remaining_errors(&self) -> &[String] {
        match self {
            Self::StillInvalid { errors } => errors,
            Self::Generation(_) | Self::Disabled => &[],
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_error_display() {
        let err = GenerationError::Timeout { secs: 30 };
        assert_eq!(err.to_string(), "generation timed out after 30s");
        assert!(err.is_timeout());
        assert!(!GenerationError::EmptyResponse.is_timeout());
    }

    #[test]
    fn repair_error_wraps_generation() {
        let err: RepairError = GenerationError::RequestFailed("503".to_string()).into();
        assert!(err.to_string().contains("503"));
        assert!(err.remaining_errors().is_empty());
    }

    #[test]
    fn still_invalid_counts_issues() {
        let err = RepairError::StillInvalid {
            errors: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "repaired text still fails validation (2 issue(s))");
        assert_eq!(err.remaining_errors().len(), 2);
    }

    #[test]
    fn invalid_value_names_field() {
        let invalid = ConfigError::InvalidValue {
            field: "repair_timeout_secs",
            reason: "must be > 0".to_string(),
        };
        assert_eq!(invalid.to_string(), "invalid value for repair_timeout_secs: must be > 0");
    }
}
