//! Sources file
//!
//! JSON description of the upstream reports and user-supplied sources of one
//! run:
//!
//! ```json
//! { "reports": [{ "model": "GPT-4" }], "additional_sources": [{ "label": "Wikipedia" }] }
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use synth_attribution::{build_source_map, AdditionalSource, ReportDescriptor, SourceMap};

/// Parsed sources file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesFile {
    /// Upstream reports, in generation order
    #[serde(default)]
    pub reports: Vec<ReportDescriptor>,
    /// User-supplied sources, in submission order
    #[serde(default)]
    pub additional_sources: Vec<AdditionalSource>,
}

impl SourcesFile {
    /// Parse from JSON text
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Read and parse a sources file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read sources file {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("invalid sources file {}", path.display()))
    }

    /// Source map for this run
    #[must_use]
    pub fn source_map(&self) -> SourceMap {
        build_source_map(&self.reports, &self.additional_sources)
    }
}
