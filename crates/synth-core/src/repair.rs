//! Single-shot attribution repair
//!
//! One generation call, one re-validation. There is no loop here: a failed
//! call or a still-invalid result is returned as an error and the caller
//! falls back to the original text.

use crate::error::{GenerationError, RepairError};
use crate::generator::SharedGenerator;
use crate::prompt::build_repair_prompt;
use std::time::Duration;
use synth_attribution::{
    parse_sections, strip_generated_breakdown, validate_synthesis_attributions, ParsedSection,
    SourceMap, ValidationResult,
};

/// Corrected document that passed validation
#[derive(Debug, Clone)]
pub struct RepairedDocument {
    /// Corrected text, without any breakdown the generator may have added
    pub text: String,
    /// Sections of the corrected text
    pub sections: Vec<ParsedSection>,
    /// Validation of the corrected text (always valid)
    pub validation: ValidationResult,
}

/// Issues the corrective call and re-validates its output
#[derive(Clone)]
pub struct RepairCoordinator {
    generator: SharedGenerator,
    timeout: Duration,
}

impl std::fmt::Debug for RepairCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepairCoordinator")
            .field("generator", &self.generator.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RepairCoordinator {
    /// Create coordinator around a generator
    #[inline]
    #[must_use]
    pub fn new(generator: SharedGenerator, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Name of the injected generator
    #[inline]
    #[must_use]
    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Run the repair
    ///
    /// # Errors
    /// - `RepairError::Generation` if the call fails, times out or returns nothing
    /// - `RepairError::StillInvalid` if the corrected text fails validation
    pub async fn repair(
        &self,
        raw_text: &str,
        source_map: &SourceMap,
    ) -> Result<RepairedDocument, RepairError> {
        let prompt = build_repair_prompt(raw_text, source_map);
        tracing::info!(
            generator = self.generator.name(),
            allowed_ids = source_map.len(),
            prompt_bytes = prompt.len(),
            "requesting attribution repair"
        );

        let response = tokio::time::timeout(self.timeout, self.generator.generate(&prompt))
            .await
            .map_err(|_| GenerationError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        let text = strip_generated_breakdown(response.trim());
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }

        let sections = parse_sections(text);
        let validation = validate_synthesis_attributions(&sections, source_map);
        if !validation.valid {
            tracing::warn!(
                remaining = validation.errors.len(),
                "repaired text still fails attribution validation"
            );
            return Err(RepairError::StillInvalid {
                errors: validation.errors,
            });
        }

        tracing::info!(sections = sections.len(), "attribution repair validated");
        Ok(RepairedDocument {
            text: text.to_string(),
            sections,
            validation,
        })
    }
}
