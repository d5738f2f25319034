//! Post-processing orchestrator
//!
//! Drives one run through its state machine:
//!
//! ```text
//!            validate
//!               │
//!      valid ───┼─── invalid
//!        │             │
//!   Complete     repair (once)
//!                 │         │
//!           validates    fails / disabled
//!                 │         │
//!             Repaired   Incomplete
//! ```
//!
//! Whatever the outcome, the breakdown of the final sections is appended to
//! the chosen text.

use crate::config::PostProcessConfig;
use crate::error::{ConfigError, RepairError};
use crate::generator::SharedGenerator;
use crate::repair::RepairCoordinator;
use crate::types::{PostProcessOutcome, SynthesisStatus};
use synth_attribution::{
    build_source_map, compute_breakdown, parse_sections, strip_generated_breakdown,
    validate_synthesis_attributions, LabeledSource, NamedReport, ParsedSection, SourceMap,
    ValidationResult,
};

/// Validates, repairs at most once, and appends the breakdown
#[derive(Debug, Clone)]
pub struct PostProcessor {
    config: PostProcessConfig,
    repair: Option<RepairCoordinator>,
}

impl PostProcessor {
    /// Create processor without a generation capability (repair unavailable)
    ///
    /// Fails when the configuration does not pass [`PostProcessConfig::validate`].
    pub fn new(config: PostProcessConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            repair: None,
        })
    }

    /// With the capability used for the repair call
    #[must_use]
    pub fn with_generator(mut self, generator: SharedGenerator) -> Self {
        self.repair = Some(RepairCoordinator::new(
            generator,
            self.config.repair_timeout(),
        ));
        self
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PostProcessConfig {
        &self.config
    }

    /// Process a composite document against its upstream sources
    ///
    /// Never fails: every defect is reflected in the returned status.
    pub async fn process<R, A>(
        &self,
        raw_text: &str,
        reports: &[R],
        additional: &[A],
    ) -> PostProcessOutcome
    where
        R: NamedReport + Sync,
        A: LabeledSource + Sync,
    {
        let source_map = build_source_map(reports, additional);
        self.process_with_map(raw_text, source_map).await
    }

    /// Process against an already built source map
    pub async fn process_with_map(&self, raw_text: &str, source_map: SourceMap) -> PostProcessOutcome {
        let text = if self.config.strip_existing_breakdown {
            strip_generated_breakdown(raw_text)
        } else {
            raw_text
        };

        let sections = parse_sections(text);
        let initial = validate_synthesis_attributions(&sections, &source_map);
        log_unk_sections(&initial);

        if initial.valid {
            tracing::info!(sections = sections.len(), "attribution validation passed");
            return Finished {
                text,
                sections: &sections,
                validation: initial.clone(),
                status: SynthesisStatus::Complete,
                repair_attempted: false,
                repair_error: None,
            }
            .into_outcome(initial, source_map);
        }

        tracing::warn!(
            issues = initial.errors.len(),
            first = initial.errors.first().map(String::as_str).unwrap_or_default(),
            "attribution validation failed"
        );

        let coordinator = match &self.repair {
            Some(coordinator) if self.config.repair_enabled => coordinator,
            _ => {
                tracing::warn!("attribution repair unavailable; marking run incomplete");
                return Finished {
                    text,
                    sections: &sections,
                    validation: initial.clone(),
                    status: SynthesisStatus::Incomplete,
                    repair_attempted: false,
                    repair_error: Some(RepairError::Disabled.to_string()),
                }
                .into_outcome(initial, source_map);
            }
        };

        match coordinator.repair(text, &source_map).await {
            Ok(repaired) => {
                log_unk_sections(&repaired.validation);
                tracing::info!(
                    generator = coordinator.generator_name(),
                    "attribution repaired"
                );
                Finished {
                    text: &repaired.text,
                    sections: &repaired.sections,
                    validation: repaired.validation.clone(),
                    status: SynthesisStatus::Repaired,
                    repair_attempted: true,
                    repair_error: None,
                }
                .into_outcome(initial, source_map)
            }
            Err(error) => {
                tracing::warn!(%error, "attribution repair failed; keeping original text");
                Finished {
                    text,
                    sections: &sections,
                    validation: initial.clone(),
                    status: SynthesisStatus::Incomplete,
                    repair_attempted: true,
                    repair_error: Some(error.to_string()),
                }
                .into_outcome(initial, source_map)
            }
        }
    }
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self {
            config: PostProcessConfig::default(),
            repair: None,
        }
    }
}

/// Terminal state before the breakdown is appended
struct Finished<'a> {
    text: &'a str,
    sections: &'a [ParsedSection],
    validation: ValidationResult,
    status: SynthesisStatus,
    repair_attempted: bool,
    repair_error: Option<String>,
}

impl Finished<'_> {
    fn into_outcome(self, initial: ValidationResult, source_map: SourceMap) -> PostProcessOutcome {
        let breakdown = compute_breakdown(self.sections, &source_map);
        let final_text = append_breakdown(self.text, &breakdown.render_markdown());

        tracing::info!(
            status = %self.status,
            ignored = breakdown.ignored.len(),
            "post-processing finished"
        );

        PostProcessOutcome {
            final_text,
            status: self.status,
            initial_validation: initial,
            validation: self.validation,
            breakdown,
            source_map,
            repair_attempted: self.repair_attempted,
            repair_error: self.repair_error,
        }
    }
}

fn append_breakdown(text: &str, breakdown: &str) -> String {
    let body = text.trim_end();
    if body.is_empty() {
        breakdown.to_string()
    } else {
        format!("{body}\n\n{breakdown}")
    }
}

fn log_unk_sections(validation: &ValidationResult) {
    if !validation.unk_sections.is_empty() {
        tracing::warn!(
            sections = ?validation.unk_sections,
            "sections declared uncertain attribution (UNK=true)"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::generator::TextGenerator;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use synth_attribution::{AdditionalSource, ReportDescriptor, BREAKDOWN_HEADING};

    struct Fixed {
        reply: Result<String, GenerationError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn fixed(reply: Result<String, GenerationError>) -> Arc<Fixed> {
        Arc::new(Fixed {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    fn reports() -> Vec<ReportDescriptor> {
        vec![ReportDescriptor::new("GPT-4"), ReportDescriptor::new("Claude")]
    }

    const VALID: &str = "## A\ntext\nAttribution: Primary=S1; Secondary=S2; Constraints=; UNK=false\n";
    const MISSING: &str = "## A\ntext\n";

    #[tokio::test]
    async fn valid_document_completes_without_repair() {
        let generator = fixed(Ok(String::new()));
        let processor = PostProcessor::default().with_generator(generator.clone());

        let outcome = processor.process(VALID, &reports(), &[] as &[AdditionalSource]).await;

        assert_eq!(outcome.status, SynthesisStatus::Complete);
        assert!(!outcome.repair_attempted);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(outcome.final_text.starts_with(VALID.trim_end()));
        assert!(outcome.final_text.contains(BREAKDOWN_HEADING));
    }

    #[tokio::test]
    async fn invalid_document_is_repaired() {
        let generator = fixed(Ok(VALID.to_string()));
        let processor = PostProcessor::default().with_generator(generator.clone());

        let outcome = processor.process(MISSING, &reports(), &[] as &[AdditionalSource]).await;

        assert_eq!(outcome.status, SynthesisStatus::Repaired);
        assert!(outcome.repair_attempted);
        assert!(!outcome.initial_validation.valid);
        assert!(outcome.validation.valid);
        assert!(outcome.final_text.starts_with(VALID.trim_end()));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_repair_keeps_original_text() {
        let generator = fixed(Err(GenerationError::RequestFailed("down".to_string())));
        let processor = PostProcessor::default().with_generator(generator.clone());

        let outcome = processor.process(MISSING, &reports(), &[] as &[AdditionalSource]).await;

        assert_eq!(outcome.status, SynthesisStatus::Incomplete);
        assert!(outcome.final_text.starts_with("## A\ntext\n\n## Source Utilization"));
        assert!(outcome.repair_error.unwrap().contains("down"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_generator_means_incomplete() {
        let outcome = PostProcessor::default()
            .process(MISSING, &reports(), &[] as &[AdditionalSource])
            .await;

        assert_eq!(outcome.status, SynthesisStatus::Incomplete);
        assert!(!outcome.repair_attempted);
        assert_eq!(
            outcome.repair_error.as_deref(),
            Some("repair disabled or no generator configured")
        );
        assert!(outcome.final_text.contains("All sources were ignored."));
    }

    #[tokio::test]
    async fn disabled_repair_skips_generator() {
        let generator = fixed(Ok(VALID.to_string()));
        let processor =
            PostProcessor::new(PostProcessConfig::new().with_repair(false))
                .unwrap()
                .with_generator(generator.clone());

        let outcome = processor.process(MISSING, &reports(), &[] as &[AdditionalSource]).await;

        assert_eq!(outcome.status, SynthesisStatus::Incomplete);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn existing_breakdown_is_replaced() {
        let input = format!("{VALID}\n{BREAKDOWN_HEADING}\n\n### Scorecard\n\n| S9 | fake |\n");
        let outcome = PostProcessor::default()
            .process(&input, &reports(), &[] as &[AdditionalSource])
            .await;

        assert_eq!(outcome.status, SynthesisStatus::Complete);
        assert_eq!(outcome.final_text.matches(BREAKDOWN_HEADING).count(), 1);
        assert!(!outcome.final_text.contains("S9"));
    }

    #[test]
    fn zero_timeout_config_is_rejected() {
        let config = PostProcessConfig {
            repair_timeout_secs: 0,
            ..PostProcessConfig::default()
        };
        let err = PostProcessor::new(config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "repair_timeout_secs", .. }));
    }

    struct Slow;

    #[async_trait]
    impl TextGenerator for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(VALID.to_string())
        }
    }

    #[tokio::test]
    async fn sub_second_timeout_still_allows_repair() {
        let config = PostProcessConfig::new().with_repair_timeout(Duration::from_millis(500));
        let processor = PostProcessor::new(config).unwrap().with_generator(Arc::new(Slow));

        let outcome = processor.process(MISSING, &reports(), &[] as &[AdditionalSource]).await;

        assert_eq!(outcome.status, SynthesisStatus::Repaired);
        assert_eq!(outcome.repair_error, None);
    }

    #[test]
    fn append_handles_empty_body() {
        assert_eq!(append_breakdown("  \n", "B\n"), "B\n");
        assert_eq!(append_breakdown("text\n\n", "B\n"), "text\n\nB\n");
    }
}
