//! Section boundary detection
//!
//! Sections are bounded by level-2 ATX headings. A document without any
//! level-2 heading falls back to level-3 headings, and a document with
//! neither is one implicit section titled `"Synthesis"`. Each fallback is an
//! independent pass over the text; no cursor is shared between them.
//!
//! Heading detection goes through pulldown-cmark so `##` lines inside fenced
//! code blocks are not mistaken for boundaries. Setext headings are ignored.

use crate::attribution::{is_attribution_line, parse_attribution_line, AttributionLine};
use pulldown_cmark::{Event, HeadingLevel, Parser as MdParser, Tag};
use serde::{Deserialize, Serialize};

/// Title of the section emitted when the document has no usable headings
pub const IMPLICIT_SECTION_TITLE: &str = "Synthesis";

/// Boundary level a section was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionLevel {
    /// `## Title`
    Two,
    /// `### Title`
    Three,
    /// Whole document, no heading
    Implicit,
}

impl SectionLevel {
    /// Numeric heading level (the implicit section counts as level 2)
    #[inline]
    #[must_use]
    pub fn as_number(self) -> u8 {
        match self {
            Self::Two | Self::Implicit => 2,
            Self::Three => 3,
        }
    }

    fn heading_level(self) -> Option<HeadingLevel> {
        match self {
            Self::Two => Some(HeadingLevel::H2),
            Self::Three => Some(HeadingLevel::H3),
            Self::Implicit => None,
        }
    }
}

/// One attribution unit of the composite document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSection {
    /// Heading text (not necessarily unique)
    pub title: String,
    /// Boundary level
    pub level: SectionLevel,
    /// Parsed attribution, `None` when absent or malformed
    pub attribution: Option<AttributionLine>,
    /// Trimmed text of the trailing `Attribution:` line, if there was one
    pub attribution_raw: Option<String>,
    /// First line of the section (the heading), 0-based
    pub start_line: usize,
    /// Last line of the section, inclusive
    pub end_line: usize,
}

impl ParsedSection {
    /// Section carries an `Attribution:` line that did not parse
    #[inline]
    #[must_use]
    pub fn has_malformed_attribution(&self) -> bool {
        self.attribution.is_none() && self.attribution_raw.is_some()
    }

    /// Section carries no `Attribution:` line at all
    #[inline]
    #[must_use]
    pub fn is_missing_attribution(&self) -> bool {
        self.attribution_raw.is_none()
    }
}

#[derive(Debug)]
struct Heading {
    line: usize,
    title: String,
}

/// Split a composite document into ordered sections
#[must_use]
pub fn parse_sections(text: &str) -> Vec<ParsedSection> {
    let lines: Vec<&str> = text.lines().collect();
    let line_starts = line_starts(text);

    let (level, headings) = [SectionLevel::Two, SectionLevel::Three]
        .into_iter()
        .map(|level| (level, collect_headings(text, &lines, &line_starts, level)))
        .find(|(_, headings)| !headings.is_empty())
        .unwrap_or((SectionLevel::Implicit, Vec::new()));

    let last_line = lines.len().saturating_sub(1);

    let sections: Vec<ParsedSection> = if headings.is_empty() {
        let (attribution, attribution_raw) = trailing_attribution(&lines, 0, last_line);
        vec![ParsedSection {
            title: IMPLICIT_SECTION_TITLE.to_string(),
            level: SectionLevel::Implicit,
            attribution,
            attribution_raw,
            start_line: 0,
            end_line: last_line,
        }]
    } else {
        headings
            .iter()
            .enumerate()
            .map(|(i, heading)| {
                let end_line = headings
                    .get(i + 1)
                    .map_or(last_line, |next| next.line.saturating_sub(1));
                let (attribution, attribution_raw) =
                    trailing_attribution(&lines, heading.line + 1, end_line);
                ParsedSection {
                    title: heading.title.clone(),
                    level,
                    attribution,
                    attribution_raw,
                    start_line: heading.line,
                    end_line,
                }
            })
            .collect()
    };

    tracing::debug!(
        sections = sections.len(),
        level = ?level,
        "parsed composite document sections"
    );

    sections
}

/// Byte offset of the heading line and title of every level-2 ATX heading
pub(crate) fn level_two_headings(text: &str) -> Vec<(usize, String)> {
    let lines: Vec<&str> = text.lines().collect();
    let starts = line_starts(text);
    collect_headings(text, &lines, &starts, SectionLevel::Two)
        .into_iter()
        .filter_map(|heading| Some((*starts.get(heading.line)?, heading.title)))
        .collect()
}

/// Byte offset of the start of every line
fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

fn line_of(line_starts: &[usize], offset: usize) -> usize {
    line_starts
        .partition_point(|&start| start <= offset)
        .saturating_sub(1)
}

fn collect_headings(
    text: &str,
    lines: &[&str],
    line_starts: &[usize],
    level: SectionLevel,
) -> Vec<Heading> {
    let Some(wanted) = level.heading_level() else {
        return Vec::new();
    };

    MdParser::new(text)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::Heading { level, .. }) if level == wanted => {
                let line = line_of(line_starts, range.start);
                let title = atx_title(lines.get(line)?)?;
                Some(Heading { line, title })
            }
            _ => None,
        })
        .collect()
}

/// Title of an ATX heading line, `None` for anything else (setext, quoted, ...)
fn atx_title(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix('#')?;
    let rest = rest.trim_start_matches('#').trim();

    // Optional closing sequence: `## Title ##`
    let without_closing = rest.trim_end_matches('#');
    let title = if without_closing.is_empty() || without_closing.ends_with(char::is_whitespace) {
        without_closing.trim()
    } else {
        rest
    };

    Some(title.to_string())
}

/// Inspect the last non-blank line of `lines[from..=to]`
fn trailing_attribution(
    lines: &[&str],
    from: usize,
    to: usize,
) -> (Option<AttributionLine>, Option<String>) {
    if from > to || lines.is_empty() {
        return (None, None);
    }

    let last = lines[from..=to.min(lines.len() - 1)]
        .iter()
        .rev()
        .map(|line| line.trim())
        .find(|line| !line.is_empty());

    match last {
        Some(line) if is_attribution_line(line) => {
            let parsed = parse_attribution_line(line);
            if parsed.is_none() {
                tracing::debug!(line, "attribution line failed to parse");
            }
            (parsed, Some(line.to_string()))
        }
        _ => (None, None),
    }
}
