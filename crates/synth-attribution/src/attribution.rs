//! Attribution line grammar
//!
//! ```text
//! Attribution: Primary=<idlist>; Secondary=<idlist>; Constraints=<idlist>; UNK=<true|false>
//! ```
//!
//! The parser is all-or-nothing: a line either yields a complete
//! [`AttributionLine`] or `None`. Partial parses are never returned.

use crate::source_id::SourceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Leading keyword of an attribution line
pub const ATTRIBUTION_KEYWORD: &str = "Attribution:";

/// Parsed attribution declaration of one section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionLine {
    /// Sources supplying the main content
    pub primary: Vec<SourceId>,
    /// Sources supplying supporting content
    pub secondary: Vec<SourceId>,
    /// Sources contributing caveats / limitations only
    pub constraints: Vec<SourceId>,
    /// Attribution declared uncertain
    pub unk: bool,
}

impl AttributionLine {
    /// Every referenced id: primary, then secondary, then constraints
    pub fn all_ids(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.primary
            .iter()
            .chain(&self.secondary)
            .chain(&self.constraints)
            .copied()
    }
}

impl fmt::Display for AttributionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ATTRIBUTION_KEYWORD} Primary={}; Secondary={}; Constraints={}; UNK={}",
            IdList(&self.primary),
            IdList(&self.secondary),
            IdList(&self.constraints),
            self.unk
        )
    }
}

struct IdList<'a>(&'a [SourceId]);

impl fmt::Display for IdList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

/// Whether the line starts with the `Attribution:` keyword (case-insensitive)
///
/// Says nothing about whether the rest of the line is well formed.
#[must_use]
pub fn is_attribution_line(line: &str) -> bool {
    strip_keyword(line.trim()).is_some()
}

fn strip_keyword(line: &str) -> Option<&str> {
    let head = line.get(..ATTRIBUTION_KEYWORD.len())?;
    if head.eq_ignore_ascii_case(ATTRIBUTION_KEYWORD) {
        Some(&line[ATTRIBUTION_KEYWORD.len()..])
    } else {
        None
    }
}

/// Parse one attribution line; `None` on any grammar violation
#[must_use]
pub fn parse_attribution_line(line: &str) -> Option<AttributionLine> {
    let body = strip_keyword(line.trim())?;

    let mut primary = None;
    let mut secondary = None;
    let mut constraints = None;
    let mut unk = false;

    for pair in body.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        let (key, value) = pair.split_once('=')?;
        let key = key.trim();
        let value = value.trim();

        if key.eq_ignore_ascii_case("primary") {
            primary = Some(parse_id_list(value)?);
        } else if key.eq_ignore_ascii_case("secondary") {
            secondary = Some(parse_id_list(value)?);
        } else if key.eq_ignore_ascii_case("constraints") {
            constraints = Some(parse_id_list(value)?);
        } else if key.eq_ignore_ascii_case("unk") {
            unk = match value {
                "true" => true,
                "false" => false,
                _ => return None,
            };
        }
    }

    Some(AttributionLine {
        primary: primary?,
        secondary: secondary?,
        constraints: constraints?,
        unk,
    })
}

fn parse_id_list(value: &str) -> Option<Vec<SourceId>> {
    if value.is_empty() {
        return Some(Vec::new());
    }

    value
        .split(',')
        .map(|token| SourceId::parse_token(token.trim()).ok())
        .collect()
}
