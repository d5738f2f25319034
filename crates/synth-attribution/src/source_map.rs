//! Run-scoped source registry
//!
//! Maps every upstream report and every optional user-supplied source to a
//! neutral [`SourceId`]. Built once per synthesis run and never mutated.

use crate::source_id::{SourceId, SourceKind};
use serde::{Deserialize, Serialize};

/// Anything that can name an upstream report
pub trait NamedReport {
    /// Name shown for this report in the breakdown
    fn display_name(&self) -> &str;
}

/// Anything that may carry a label for a user-supplied source
pub trait LabeledSource {
    /// Optional label; `None` or blank falls back to `Source <k>`
    fn label(&self) -> Option<&str>;
}

/// Upstream report descriptor as delivered by the generation stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDescriptor {
    /// Provider / model display name
    pub model: String,
}

impl ReportDescriptor {
    /// Create descriptor for a model name
    #[inline]
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

impl NamedReport for ReportDescriptor {
    fn display_name(&self) -> &str {
        &self.model
    }
}

/// User-supplied source descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalSource {
    /// Optional display label
    #[serde(default)]
    pub label: Option<String>,
}

impl AdditionalSource {
    /// Source with a label
    #[inline]
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }

    /// Source without a label
    #[inline]
    #[must_use]
    pub fn unlabeled() -> Self {
        Self::default()
    }
}

impl LabeledSource for AdditionalSource {
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// One entry of the source map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMapItem {
    /// Neutral identifier
    pub id: SourceId,
    /// Kind (mirrors the id tag)
    pub kind: SourceKind,
    /// Human-readable name
    pub display_name: String,
}

/// Ordered, immutable registry of sources for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceMap {
    items: Vec<SourceMapItem>,
}

impl SourceMap {
    /// Number of sources
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no sources are registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries in map order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, SourceMapItem> {
        self.items.iter()
    }

    /// Entries as a slice
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[SourceMapItem] {
        &self.items
    }

    /// Look up an entry by id
    #[must_use]
    pub fn get(&self, id: SourceId) -> Option<&SourceMapItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Position of an id in map order
    #[must_use]
    pub fn position(&self, id: SourceId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Whether the id resolves in this map
    #[inline]
    #[must_use]
    pub fn contains(&self, id: SourceId) -> bool {
        self.position(id).is_some()
    }

    /// All ids in map order
    #[must_use]
    pub fn allowed_ids(&self) -> Vec<SourceId> {
        self.items.iter().map(|item| item.id).collect()
    }
}

impl<'a> IntoIterator for &'a SourceMap {
    type Item = &'a SourceMapItem;
    type IntoIter = std::slice::Iter<'a, SourceMapItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Build the source map: `S1..SN` for reports, then `U1..UM` for user sources
#[must_use]
pub fn build_source_map<R, A>(reports: &[R], additional: &[A]) -> SourceMap
where
    R: NamedReport,
    A: LabeledSource,
{
    let llm = reports.iter().zip(1u32..).map(|(report, n)| SourceMapItem {
        id: SourceId::Llm(n),
        kind: SourceKind::Llm,
        display_name: report.display_name().to_string(),
    });

    let user = additional.iter().zip(1u32..).map(|(source, n)| SourceMapItem {
        id: SourceId::User(n),
        kind: SourceKind::User,
        display_name: source
            .label()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map_or_else(|| format!("Source {n}"), str::to_string),
    });

    SourceMap {
        items: llm.chain(user).collect(),
    }
}
