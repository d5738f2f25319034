//! Synthesis Core - Attribution Post-Processing
//!
//! Takes a composite report produced upstream and:
//! - Validates every section's attribution against the run's source map
//! - Issues at most one corrective call to a text-generation capability
//! - Appends a deterministic source utilization breakdown
//! - Reports a terminal status (`complete`, `repaired`, `incomplete`)
//!
//! # Example
//!
//! ```rust,ignore
//! use synth_core::{PostProcessConfig, PostProcessor};
//! use synth_attribution::{AdditionalSource, ReportDescriptor};
//!
//! # async fn example(generator: synth_core::SharedGenerator, text: &str) {
//! let processor = PostProcessor::new(PostProcessConfig::new())?.with_generator(generator);
//!
//! let reports = [ReportDescriptor::new("GPT-4"), ReportDescriptor::new("Claude")];
//! let outcome = processor.process(text, &reports, &[] as &[AdditionalSource]).await;
//!
//! println!("status: {}", outcome.status);
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod generator;
pub mod orchestrator;
pub mod prompt;
pub mod repair;
pub mod types;

// Re-exports for convenience
pub use config::PostProcessConfig;
pub use error::{ConfigError, GenerationError, RepairError};
pub use generator::{SharedGenerator, TextGenerator};
pub use orchestrator::PostProcessor;
pub use prompt::{attribution_rules, build_repair_prompt, format_allowed_ids};
pub use repair::{RepairCoordinator, RepairedDocument};
pub use types::{PostProcessOutcome, SynthesisStatus};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with synthesis post-processing
    pub use crate::{
        PostProcessConfig, PostProcessOutcome, PostProcessor, SharedGenerator, SynthesisStatus,
        TextGenerator,
    };
    pub use synth_attribution::{AdditionalSource, ReportDescriptor};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
