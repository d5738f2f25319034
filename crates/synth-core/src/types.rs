//! Core types for post-processing
//!
//! Defines the terminal status of a run and the value handed back to the
//! caller, who owns persistence of both.

use serde::{Deserialize, Serialize};
use std::fmt;
use synth_attribution::{Breakdown, SourceMap, ValidationResult};

/// Terminal state of a post-processing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisStatus {
    /// Initial validation passed; repair never invoked
    Complete,
    /// Initial validation failed, the repaired text validates
    Repaired,
    /// Initial validation failed and no validating repair was obtained
    Incomplete,
}

impl SynthesisStatus {
    /// Wire spelling
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Repaired => "repaired",
            Self::Incomplete => "incomplete",
        }
    }

    /// Final text carries fully valid attribution
    #[inline]
    #[must_use]
    pub fn is_valid(self) -> bool {
        !matches!(self, Self::Incomplete)
    }
}

impl fmt::Display for SynthesisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one post-processing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostProcessOutcome {
    /// Chosen text (original or repaired) with the breakdown appended
    pub final_text: String,
    /// Terminal status
    pub status: SynthesisStatus,
    /// Validation of the initial text
    pub initial_validation: ValidationResult,
    /// Validation of the text that was finally chosen
    pub validation: ValidationResult,
    /// Breakdown appended to `final_text`
    pub breakdown: Breakdown,
    /// Source map used for the run
    pub source_map: SourceMap,
    /// Whether the one generation call was made
    pub repair_attempted: bool,
    /// Why the repair did not produce a valid document
    pub repair_error: Option<String>,
}
