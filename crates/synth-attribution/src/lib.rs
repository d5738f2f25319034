//! Synthesis Attribution Layer
//!
//! The verification boundary between a generated composite report and the
//! sources it claims to be built from.
//!
//! # Core Operations
//!
//! - **Map**: assign neutral ids (`S<n>` for reports, `U<n>` for user sources)
//! - **Parse**: split the document into sections and read each trailing
//!   `Attribution:` line
//! - **Validate**: check every declared id against the source map
//! - **Summarize**: render a deterministic per-source scorecard
//!
//! # Architecture
//!
//! ```text
//! reports + user sources → SourceMap ─┐
//!                                     ├→ validate → ValidationResult
//! composite text → Vec<ParsedSection> ┤
//!                                     └→ compute_breakdown → Breakdown → markdown
//! ```
//!
//! # Example
//!
//! ```rust
//! use synth_attribution::prelude::*;
//!
//! let map = build_source_map(
//!     &[ReportDescriptor::new("GPT-4")],
//!     &[AdditionalSource::labeled("Wikipedia")],
//! );
//! let doc = "## Overview\nText.\nAttribution: Primary=S1; Secondary=U1; Constraints=; UNK=false\n";
//!
//! let sections = parse_sections(doc);
//! assert!(validate_synthesis_attributions(&sections, &map).valid);
//! assert!(generate_breakdown(&sections, &map).contains("| S1 | GPT-4 | 1 | 0 | 0 | 3 |"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod attribution;
pub mod breakdown;
pub mod error;
pub mod section;
pub mod source_id;
pub mod source_map;
pub mod validation;

// Re-exports for convenience
pub use attribution::{is_attribution_line, parse_attribution_line, AttributionLine};
pub use breakdown::{
    compute_breakdown, generate_breakdown, score, strip_generated_breakdown, Breakdown,
    BreakdownEntry, UsedFor, BREAKDOWN_DISCLAIMER, BREAKDOWN_HEADING, BREAKDOWN_TITLE,
    PRIMARY_WEIGHT, SECONDARY_WEIGHT,
};
pub use error::{AttributionError, AttributionResult};
pub use section::{parse_sections, ParsedSection, SectionLevel, IMPLICIT_SECTION_TITLE};
pub use source_id::{SourceId, SourceKind};
pub use source_map::{
    build_source_map, AdditionalSource, LabeledSource, NamedReport, ReportDescriptor, SourceMap,
    SourceMapItem,
};
pub use validation::{validate_synthesis_attributions, AttributionIssue, ValidationResult};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the attribution layer
    pub use crate::attribution::{parse_attribution_line, AttributionLine};
    pub use crate::breakdown::{compute_breakdown, generate_breakdown, Breakdown};
    pub use crate::section::{parse_sections, ParsedSection};
    pub use crate::source_id::{SourceId, SourceKind};
    pub use crate::source_map::{build_source_map, AdditionalSource, ReportDescriptor, SourceMap};
    pub use crate::validation::{validate_synthesis_attributions, ValidationResult};
}
