//! Deterministic source utilization breakdown
//!
//! Counts how each source was declared across sections and renders a fixed
//! markdown appendix. Output depends only on the inputs: no timestamps, no
//! randomness, no hash-map iteration order.

use crate::section::{level_two_headings, ParsedSection};
use crate::source_id::SourceId;
use crate::source_map::SourceMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Heading of the generated appendix; upstream generation must never emit it
pub const BREAKDOWN_HEADING: &str = "## Source Utilization Breakdown (Generated)";

/// [`BREAKDOWN_HEADING`] without the `## ` marker
pub const BREAKDOWN_TITLE: &str = "Source Utilization Breakdown (Generated)";

/// Footer stating how the breakdown was derived
pub const BREAKDOWN_DISCLAIMER: &str = "*This breakdown is derived strictly from the parsed \
Attribution markers. No interpretation or content analysis was applied.*";

/// Weight of one primary reference in the score
pub const PRIMARY_WEIGHT: u32 = 3;
/// Weight of one secondary reference in the score
pub const SECONDARY_WEIGHT: u32 = 1;

const EMPTY_ROLE: &str = "—";

/// Section titles grouped by the role a source played in them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedFor {
    /// Sections where the source was primary
    pub primary: Vec<String>,
    /// Sections where the source was secondary
    pub secondary: Vec<String>,
    /// Sections where the source only supplied caveats
    pub constraints: Vec<String>,
}

/// Per-source scorecard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    /// Source id
    pub id: SourceId,
    /// Display name from the source map
    pub name: String,
    /// Sections citing the source as primary
    pub primary_count: u32,
    /// Sections citing the source as secondary
    pub secondary_count: u32,
    /// Sections citing the source for constraints
    pub constraints_count: u32,
    /// `3 * primary + secondary`
    pub score: u32,
    /// Section titles per role
    pub used_for: UsedFor,
}

impl BreakdownEntry {
    fn new(id: SourceId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            primary_count: 0,
            secondary_count: 0,
            constraints_count: 0,
            score: 0,
            used_for: UsedFor::default(),
        }
    }

    /// Source was never referenced in any role
    #[inline]
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.primary_count == 0 && self.secondary_count == 0 && self.constraints_count == 0
    }
}

/// Score for a pair of counts; constraints never contribute
#[inline]
#[must_use]
pub fn score(primary_count: u32, secondary_count: u32) -> u32 {
    primary_count * PRIMARY_WEIGHT + secondary_count * SECONDARY_WEIGHT
}

/// Computed breakdown for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    /// One entry per source, score-descending, ties in source-map order
    pub entries: Vec<BreakdownEntry>,
    /// Sources with no references, in source-map order
    pub ignored: Vec<SourceId>,
    /// Number of sections inspected
    pub section_count: usize,
}

#[derive(Clone, Copy)]
enum Role {
    Primary,
    Secondary,
    Constraints,
}

/// Count declared usage per source
#[must_use]
pub fn compute_breakdown(sections: &[ParsedSection], source_map: &SourceMap) -> Breakdown {
    let mut entries: Vec<BreakdownEntry> = source_map
        .iter()
        .map(|item| BreakdownEntry::new(item.id, &item.display_name))
        .collect();

    for section in sections {
        let Some(attribution) = &section.attribution else {
            continue;
        };

        let mut seen: Vec<(usize, u8)> = Vec::new();
        let roles = [
            (Role::Primary, &attribution.primary),
            (Role::Secondary, &attribution.secondary),
            (Role::Constraints, &attribution.constraints),
        ];

        for (role, ids) in roles {
            for id in ids {
                // Unknown ids are validator findings, not scorecard rows
                let Some(pos) = source_map.position(*id) else {
                    continue;
                };
                let key = (pos, role as u8);
                if seen.contains(&key) {
                    continue;
                }
                seen.push(key);

                let entry = &mut entries[pos];
                let title = section.title.clone();
                match role {
                    Role::Primary => {
                        entry.primary_count += 1;
                        entry.used_for.primary.push(title);
                    }
                    Role::Secondary => {
                        entry.secondary_count += 1;
                        entry.used_for.secondary.push(title);
                    }
                    Role::Constraints => {
                        entry.constraints_count += 1;
                        entry.used_for.constraints.push(title);
                    }
                }
            }
        }
    }

    for entry in &mut entries {
        entry.score = score(entry.primary_count, entry.secondary_count);
    }

    let ignored = entries
        .iter()
        .filter(|entry| entry.is_ignored())
        .map(|entry| entry.id)
        .collect();

    // `sort_by` is stable, so ties keep source-map order
    entries.sort_by(|a, b| b.score.cmp(&a.score));

    Breakdown {
        entries,
        ignored,
        section_count: sections.len(),
    }
}

/// Compute and render the appendix in one step
#[must_use]
pub fn generate_breakdown(sections: &[ParsedSection], source_map: &SourceMap) -> String {
    compute_breakdown(sections, source_map).render_markdown()
}

impl Breakdown {
    /// Every registered source went unreferenced
    #[inline]
    #[must_use]
    pub fn all_ignored(&self) -> bool {
        !self.entries.is_empty() && self.ignored.len() == self.entries.len()
    }

    /// Render the fixed-format markdown appendix
    #[must_use]
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(BREAKDOWN_HEADING);
        out.push_str("\n\n### Scorecard\n\n");

        if self.section_count == 0 {
            out.push_str("No sections found.\n");
        } else if self.entries.is_empty() {
            out.push_str("No sources registered.\n");
        } else {
            out.push_str("| ID | Name | Primary | Secondary | Constraints | Score |\n");
            out.push_str("|----|------|---------|-----------|-------------|-------|\n");
            for entry in &self.entries {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} | {} |",
                    entry.id,
                    escape_cell(&entry.name),
                    entry.primary_count,
                    entry.secondary_count,
                    entry.constraints_count,
                    entry.score
                );
            }
        }

        out.push_str("\n### Per-Source Usage\n\n");
        if self.section_count == 0 {
            out.push_str("No sections found.\n");
        } else if self.entries.is_empty() {
            out.push_str("No sources registered.\n");
        } else {
            for entry in &self.entries {
                let _ = writeln!(out, "- **{} ({})**", entry.id, entry.name);
                let _ = writeln!(out, "  - Primary: {}", join_titles(&entry.used_for.primary));
                let _ = writeln!(out, "  - Secondary: {}", join_titles(&entry.used_for.secondary));
                let _ = writeln!(
                    out,
                    "  - Constraints: {}",
                    join_titles(&entry.used_for.constraints)
                );
            }
        }

        out.push_str("\n### Ignored Sources\n\n");
        if self.ignored.is_empty() {
            out.push_str("None.\n");
        } else if self.all_ignored() {
            out.push_str("All sources were ignored.\n");
        } else {
            for id in &self.ignored {
                let name = self
                    .entries
                    .iter()
                    .find(|entry| entry.id == *id)
                    .map_or("", |entry| entry.name.as_str());
                let _ = writeln!(out, "- {id} ({name})");
            }
        }

        out.push_str("\n---\n");
        out.push_str(BREAKDOWN_DISCLAIMER);
        out.push('\n');
        out
    }
}

fn join_titles(titles: &[String]) -> String {
    if titles.is_empty() {
        EMPTY_ROLE.to_string()
    } else {
        titles.join(", ")
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Drop a previously generated appendix
///
/// Only a trailing appendix is removed: the generated heading must be the last
/// level-2 ATX heading of the document, outside code fences. Anywhere else it
/// is left in place and becomes an ordinary section.
#[must_use]
pub fn strip_generated_breakdown(text: &str) -> &str {
    match level_two_headings(text).pop() {
        Some((offset, title)) if title == BREAKDOWN_TITLE => {
            let body = text[..offset].trim_end();
            tracing::warn!(
                removed_bytes = text.len() - offset,
                "removed previously generated breakdown appendix"
            );
            body
        }
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::AttributionLine;
    use crate::section::{parse_sections, SectionLevel};
    use crate::source_map::{build_source_map, AdditionalSource, ReportDescriptor};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn sample_map() -> SourceMap {
        build_source_map(
            &[ReportDescriptor::new("GPT-4"), ReportDescriptor::new("Claude")],
            &[AdditionalSource::labeled("Wikipedia")],
        )
    }

    fn section(title: &str, attribution: Option<AttributionLine>) -> ParsedSection {
        ParsedSection {
            title: title.to_string(),
            level: SectionLevel::Two,
            attribution,
            attribution_raw: None,
            start_line: 0,
            end_line: 0,
        }
    }

    fn line(primary: &[SourceId], secondary: &[SourceId], constraints: &[SourceId]) -> AttributionLine {
        AttributionLine {
            primary: primary.to_vec(),
            secondary: secondary.to_vec(),
            constraints: constraints.to_vec(),
            unk: false,
        }
    }

    #[test]
    fn score_weights() {
        assert_eq!(score(4, 1), 13);
        assert_eq!(score(2, 3), 9);
        assert_eq!(score(0, 0), 0);
    }

    #[test]
    fn counts_and_orders_entries() {
        let s1 = SourceId::Llm(1);
        let s2 = SourceId::Llm(2);
        let u1 = SourceId::User(1);
        let sections = vec![
            section("Overview", Some(line(&[s2], &[s1], &[]))),
            section("Findings", Some(line(&[s2], &[], &[s1]))),
            section("Risks", Some(line(&[], &[s1], &[u1]))),
        ];

        let breakdown = compute_breakdown(&sections, &sample_map());
        let ids: Vec<_> = breakdown.entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![s2, s1, u1]);

        let top = &breakdown.entries[0];
        assert_eq!((top.primary_count, top.secondary_count, top.score), (2, 0, 6));
        assert_eq!(top.used_for.primary, vec!["Overview", "Findings"]);

        let second = &breakdown.entries[1];
        assert_eq!(
            (second.primary_count, second.secondary_count, second.constraints_count, second.score),
            (0, 2, 1, 2)
        );

        let third = &breakdown.entries[2];
        assert_eq!(third.constraints_count, 1);
        assert_eq!(third.score, 0);
        assert!(breakdown.ignored.is_empty());
    }

    #[test]
    fn ties_keep_source_map_order() {
        let sections = vec![section(
            "Only",
            Some(line(&[SourceId::User(1), SourceId::Llm(2), SourceId::Llm(1)], &[], &[])),
        )];
        let breakdown = compute_breakdown(&sections, &sample_map());
        let ids: Vec<_> = breakdown.entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![SourceId::Llm(1), SourceId::Llm(2), SourceId::User(1)]);
    }

    #[test]
    fn missing_attribution_and_unknown_ids_are_skipped() {
        let sections = vec![
            section("Missing", None),
            section("Unknown", Some(line(&[SourceId::Llm(9)], &[SourceId::Llm(1)], &[]))),
        ];
        let breakdown = compute_breakdown(&sections, &sample_map());

        assert_eq!(breakdown.entries.len(), 3);
        assert_eq!(breakdown.entries[0].id, SourceId::Llm(1));
        assert_eq!(breakdown.entries[0].score, 1);
        assert_eq!(breakdown.ignored, vec![SourceId::Llm(2), SourceId::User(1)]);
    }

    #[test]
    fn repeated_id_in_one_role_counts_once() {
        let s1 = SourceId::Llm(1);
        let sections = vec![section("Dup", Some(line(&[s1, s1], &[s1], &[])))];
        let breakdown = compute_breakdown(&sections, &sample_map());

        let entry = &breakdown.entries[0];
        assert_eq!(entry.primary_count, 1);
        assert_eq!(entry.secondary_count, 1);
        assert_eq!(entry.used_for.primary, vec!["Dup"]);
    }

    #[test]
    fn renders_full_appendix() {
        let doc = "## Overview\ntext\nAttribution: Primary=S1; Secondary=U1; Constraints=; UNK=false\n\
                   ## Risks\ntext\nAttribution: Primary=; Secondary=; Constraints=S1; UNK=false\n";
        let rendered = generate_breakdown(&parse_sections(doc), &sample_map());

        let expected = "\
## Source Utilization Breakdown (Generated)

### Scorecard

| ID | Name | Primary | Secondary | Constraints | Score |
|----|------|---------|-----------|-------------|-------|
| S1 | GPT-4 | 1 | 0 | 1 | 3 |
| U1 | Wikipedia | 0 | 1 | 0 | 1 |
| S2 | Claude | 0 | 0 | 0 | 0 |

### Per-Source Usage

- **S1 (GPT-4)**
  - Primary: Overview
  - Secondary: —
  - Constraints: Risks
- **U1 (Wikipedia)**
  - Primary: —
  - Secondary: Overview
  - Constraints: —
- **S2 (Claude)**
  - Primary: —
  - Secondary: —
  - Constraints: —

### Ignored Sources

- S2 (Claude)

---
*This breakdown is derived strictly from the parsed Attribution markers. No interpretation or content analysis was applied.*
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn renders_all_ignored() {
        let sections = parse_sections("no attribution anywhere\n");
        let rendered = generate_breakdown(&sections, &sample_map());

        assert!(rendered.contains("All sources were ignored."));
        assert!(rendered.contains("| S1 | GPT-4 | 0 | 0 | 0 | 0 |"));
    }

    #[test]
    fn renders_no_sections() {
        let rendered = generate_breakdown(&[], &sample_map());
        assert!(rendered.contains("### Scorecard\n\nNo sections found.\n"));
        assert!(rendered.contains("All sources were ignored."));
        assert!(rendered.ends_with(&format!("{BREAKDOWN_DISCLAIMER}\n")));
    }

    #[test]
    fn renders_empty_map() {
        let sections = parse_sections("## A\ntext\n");
        let rendered = generate_breakdown(&sections, &SourceMap::default());
        assert!(rendered.contains("No sources registered."));
        assert!(rendered.contains("### Ignored Sources\n\nNone.\n"));
    }

    #[test]
    fn pipes_in_names_are_escaped_in_table() {
        let map = build_source_map(&[ReportDescriptor::new("a|b")], &[] as &[AdditionalSource]);
        let rendered = generate_breakdown(&parse_sections("plain"), &map);
        assert!(rendered.contains("| S1 | a\\|b | 0 | 0 | 0 | 0 |"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let doc = "## A\nAttribution: Primary=S2; Secondary=S1; Constraints=U1; UNK=true\n";
        let sections = parse_sections(doc);
        let map = sample_map();
        assert_eq!(generate_breakdown(&sections, &map), generate_breakdown(&sections, &map));
    }

    #[test]
    fn heading_and_title_agree() {
        assert_eq!(BREAKDOWN_HEADING, format!("## {BREAKDOWN_TITLE}"));
    }

    #[test]
    fn strips_existing_appendix() {
        let text = format!("## A\nbody\n\n{BREAKDOWN_HEADING}\n\n### Scorecard\nfake\n");
        assert_eq!(strip_generated_breakdown(&text), "## A\nbody");
        assert_eq!(strip_generated_breakdown("## A\nbody\n"), "## A\nbody\n");
    }

    #[test]
    fn strips_rendered_appendix() {
        let body = "## A\ntext\nAttribution: Primary=S1; Secondary=; Constraints=; UNK=false";
        let rendered = generate_breakdown(&parse_sections(body), &sample_map());
        let text = format!("{body}\n\n{rendered}");
        assert_eq!(strip_generated_breakdown(&text), body);
    }

    #[test]
    fn mid_document_heading_is_kept() {
        let text = format!(
            "## A\nbody\nAttribution: Primary=S1; Secondary=; Constraints=; UNK=false\n\
             {BREAKDOWN_HEADING}\nmodel chatter\n\n## B\nreal content B\n"
        );
        assert_eq!(strip_generated_breakdown(&text), text);

        let sections = parse_sections(strip_generated_breakdown(&text));
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", BREAKDOWN_TITLE, "B"]);
        assert!(sections[1].is_missing_attribution());
        assert!(sections[2].is_missing_attribution());
    }

    #[test]
    fn fenced_heading_is_kept() {
        let text = format!(
            "## Real\n```\n{BREAKDOWN_HEADING}\n```\n\
             Attribution: Primary=S1; Secondary=; Constraints=; UNK=false\n"
        );
        assert_eq!(strip_generated_breakdown(&text), text);

        let sections = parse_sections(&text);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].attribution.is_some());
    }

    fn arb_ids() -> impl Strategy<Value = Vec<SourceId>> {
        let id = prop_oneof![(1u32..4).prop_map(SourceId::Llm), (1u32..3).prop_map(SourceId::User)];
        proptest::collection::vec(id, 0..4)
    }

    fn arb_sections() -> impl Strategy<Value = Vec<ParsedSection>> {
        let attr = proptest::option::of((arb_ids(), arb_ids(), arb_ids()).prop_map(|(p, s, c)| {
            AttributionLine {
                primary: p,
                secondary: s,
                constraints: c,
                unk: false,
            }
        }));
        proptest::collection::vec(attr, 0..6).prop_map(|attrs| {
            attrs
                .into_iter()
                .enumerate()
                .map(|(i, a)| section(&format!("Section {i}"), a))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_score_formula_and_order(sections in arb_sections()) {
            let map = sample_map();
            let breakdown = compute_breakdown(&sections, &map);

            prop_assert_eq!(breakdown.entries.len(), map.len());
            for entry in &breakdown.entries {
                prop_assert_eq!(entry.score, entry.primary_count * 3 + entry.secondary_count);
            }
            for pair in breakdown.entries.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(map.position(pair[0].id) < map.position(pair[1].id));
                }
            }
        }

        #[test]
        fn prop_constraints_never_change_score(sections in arb_sections()) {
            let map = sample_map();
            let stripped: Vec<ParsedSection> = sections
                .iter()
                .cloned()
                .map(|mut s| {
                    if let Some(a) = s.attribution.as_mut() {
                        a.constraints.clear();
                    }
                    s
                })
                .collect();

            let with = compute_breakdown(&sections, &map);
            let without = compute_breakdown(&stripped, &map);
            for entry in &with.entries {
                let other = without.entries.iter().find(|e| e.id == entry.id).unwrap();
                prop_assert_eq!(entry.score, other.score);
            }
        }
    }
}
