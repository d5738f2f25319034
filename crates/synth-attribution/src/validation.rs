//! Attribution validation against the run's source map
//!
//! Every section is checked; validation never stops at the first defect so a
//! single report lists everything a repair pass has to fix.

use crate::section::ParsedSection;
use crate::source_id::SourceId;
use crate::source_map::SourceMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One attribution defect, tied to the offending section by title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributionIssue {
    /// No `Attribution:` line at the end of the section
    MissingAttribution {
        /// Section title
        section: String,
    },
    /// An `Attribution:` line is present but violates the grammar
    MalformedAttribution {
        /// Section title
        section: String,
    },
    /// A referenced id is not in the source map
    UnknownSourceId {
        /// Section title
        section: String,
        /// Offending id
        id: SourceId,
    },
}

impl AttributionIssue {
    /// Title of the offending section
    #[must_use]
    pub fn section(&self) -> &str {
        match self {
            Self::MissingAttribution { section }
            | Self::MalformedAttribution { section }
            | Self::UnknownSourceId { section, .. } => section,
        }
    }
}

impl fmt::Display for AttributionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAttribution { section } => {
                write!(f, "Section \"{section}\" is missing Attribution line")
            }
            Self::MalformedAttribution { section } => {
                write!(f, "Section \"{section}\" has malformed Attribution line")
            }
            Self::UnknownSourceId { section, id } => {
                write!(f, "Section \"{section}\" references unknown source ID: {id}")
            }
        }
    }
}

/// Outcome of validating every section of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// No issues were found
    pub valid: bool,
    /// Human-readable issue descriptions, in document order
    pub errors: Vec<String>,
    /// Structured issues behind `errors`
    pub issues: Vec<AttributionIssue>,
    /// Titles of sections that declared `UNK=true`
    pub unk_sections: Vec<String>,
}

impl ValidationResult {
    fn from_issues(issues: Vec<AttributionIssue>, unk_sections: Vec<String>) -> Self {
        Self {
            valid: issues.is_empty(),
            errors: issues.iter().map(ToString::to_string).collect(),
            issues,
            unk_sections,
        }
    }
}

/// Check every section's attribution against the source map
#[must_use]
pub fn validate_synthesis_attributions(
    sections: &[ParsedSection],
    source_map: &SourceMap,
) -> ValidationResult {
    let mut issues = Vec::new();
    let mut unk_sections = Vec::new();

    for section in sections {
        let Some(attribution) = &section.attribution else {
            let title = section.title.clone();
            issues.push(if section.has_malformed_attribution() {
                AttributionIssue::MalformedAttribution { section: title }
            } else {
                AttributionIssue::MissingAttribution { section: title }
            });
            continue;
        };

        if attribution.unk {
            unk_sections.push(section.title.clone());
        }

        issues.extend(
            attribution
                .all_ids()
                .filter(|id| !source_map.contains(*id))
                .map(|id| AttributionIssue::UnknownSourceId {
                    section: section.title.clone(),
                    id,
                }),
        );
    }

    ValidationResult::from_issues(issues, unk_sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::parse_sections;
    use crate::source_map::{build_source_map, AdditionalSource, ReportDescriptor};

    fn two_report_map() -> SourceMap {
        build_source_map(
            &[ReportDescriptor::new("GPT-4"), ReportDescriptor::new("Claude")],
            &[] as &[AdditionalSource],
        )
    }

    #[test]
    fn well_formed_document_is_valid() {
        let doc = "## A\ntext\nAttribution: Primary=S1; Secondary=S2; Constraints=; UNK=false\n\
                   ## B\ntext\nAttribution: Primary=S2; Secondary=; Constraints=S1; UNK=false\n";
        let result = validate_synthesis_attributions(&parse_sections(doc), &two_report_map());

        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.unk_sections.is_empty());
    }

    #[test]
    fn unknown_id_names_section_and_id() {
        let doc = "## Risks\ntext\nAttribution: Primary=S99; Secondary=; Constraints=; UNK=false\n";
        let result = validate_synthesis_attributions(&parse_sections(doc), &two_report_map());

        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec!["Section \"Risks\" references unknown source ID: S99".to_string()]
        );
    }

    #[test]
    fn missing_and_malformed_are_distinguished() {
        let doc = "## Missing\ntext only\n\
                   ## Malformed\ntext\nAttribution: Primary=S1; UNK=maybe\n";
        let result = validate_synthesis_attributions(&parse_sections(doc), &two_report_map());

        assert_eq!(
            result.errors,
            vec![
                "Section \"Missing\" is missing Attribution line".to_string(),
                "Section \"Malformed\" has malformed Attribution line".to_string(),
            ]
        );
    }

    #[test]
    fn zero_or_padded_index_is_malformed_not_unknown() {
        let doc = "## Zero\ntext\nAttribution: Primary=S0; Secondary=; Constraints=; UNK=false\n\
                   ## Padded\ntext\nAttribution: Primary=S01; Secondary=; Constraints=; UNK=false\n";
        let result = validate_synthesis_attributions(&parse_sections(doc), &two_report_map());

        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "Section \"Zero\" has malformed Attribution line".to_string(),
                "Section \"Padded\" has malformed Attribution line".to_string(),
            ]
        );
    }

    #[test]
    fn unk_sections_still_checked_for_unknown_ids() {
        let doc = "## Unsure\ntext\nAttribution: Primary=; Secondary=U4; Constraints=; UNK=true\n";
        let result = validate_synthesis_attributions(&parse_sections(doc), &two_report_map());

        assert!(!result.valid);
        assert_eq!(result.unk_sections, vec!["Unsure".to_string()]);
        assert_eq!(
            result.issues,
            vec![AttributionIssue::UnknownSourceId {
                section: "Unsure".to_string(),
                id: SourceId::User(4),
            }]
        );
    }

    #[test]
    fn unk_section_with_known_ids_is_valid() {
        let doc = "## Unsure\ntext\nAttribution: Primary=S1; Secondary=; Constraints=; UNK=true\n";
        let result = validate_synthesis_attributions(&parse_sections(doc), &two_report_map());

        assert!(result.valid);
        assert_eq!(result.unk_sections, vec!["Unsure".to_string()]);
    }

    #[test]
    fn collects_every_defect() {
        let doc = "## One\nAttribution: Primary=S3,S4; Secondary=; Constraints=U1; UNK=false\n\
                   ## Two\nnothing\n\
                   ## Three\nAttribution: Primary=S1; Secondary=; Constraints=; UNK=false\n";
        let result = validate_synthesis_attributions(&parse_sections(doc), &two_report_map());

        assert_eq!(result.errors.len(), 4);
        assert_eq!(result.issues[0].section(), "One");
        assert_eq!(result.issues[3].section(), "Two");
    }

    #[test]
    fn duplicate_titles_report_their_own_defect() {
        let doc = "## Notes\nAttribution: bogus\n## Notes\nplain\n";
        let result = validate_synthesis_attributions(&parse_sections(doc), &two_report_map());

        assert_eq!(
            result.errors,
            vec![
                "Section \"Notes\" has malformed Attribution line".to_string(),
                "Section \"Notes\" is missing Attribution line".to_string(),
            ]
        );
    }

    #[test]
    fn issue_serializes_with_kind_tag() {
        let issue = AttributionIssue::UnknownSourceId {
            section: "X".to_string(),
            id: SourceId::Llm(7),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "kind": "unknown_source_id", "section": "X", "id": "S7" })
        );
    }
}
