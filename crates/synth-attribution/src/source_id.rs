//! Neutral source identifiers
//!
//! A [`SourceId`] is a tagged value: either the n-th upstream LLM report or
//! the n-th user-supplied source. The `S<n>` / `U<n>` spelling exists only at
//! the text boundary (`Display`, `FromStr`, serde).

use crate::error::{AttributionError, AttributionResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Uppercase prefix followed by a positive index without leading zeros
static ID_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([SU])([1-9][0-9]*)$").expect("static source id pattern is valid")
});

/// Kind of upstream source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Report produced by a text-generation provider
    Llm,
    /// Source supplied by the user
    User,
}

impl SourceKind {
    /// Wire prefix for ids of this kind
    #[inline]
    #[must_use]
    pub fn prefix(self) -> char {
        match self {
            Self::Llm => 'S',
            Self::User => 'U',
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Llm => f.write_str("llm"),
            Self::User => f.write_str("user"),
        }
    }
}

/// Identifier of one source within a run (1-based index per kind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceId {
    /// `S<n>`
    Llm(u32),
    /// `U<n>`
    User(u32),
}

impl SourceId {
    /// Kind of the referenced source
    #[inline]
    #[must_use]
    pub fn kind(self) -> SourceKind {
        match self {
            Self::Llm(_) => SourceKind::Llm,
            Self::User(_) => SourceKind::User,
        }
    }

    /// Index within the kind
    #[inline]
    #[must_use]
    pub fn index(self) -> u32 {
        match self {
            Self::Llm(n) | Self::User(n) => n,
        }
    }

    /// Build an id from kind and index
    #[inline]
    #[must_use]
    pub fn new(kind: SourceKind, index: u32) -> Self {
        match kind {
            SourceKind::Llm => Self::Llm(index),
            SourceKind::User => Self::User(index),
        }
    }

    /// Parse a single wire token
    ///
    /// Rejects lowercase prefixes, surrounding text, index 0 and leading zeros,
    /// so every accepted token is exactly the `Display` form of its value.
    pub fn parse_token(token: &str) -> AttributionResult<Self> {
        let caps = ID_TOKEN
            .captures(token)
            .ok_or_else(|| AttributionError::InvalidSourceId(token.to_string()))?;

        let index: u32 = caps[2]
            .parse()
            .map_err(|_| AttributionError::IndexOutOfRange(token.to_string()))?;

        match &caps[1] {
            "S" => Ok(Self::Llm(index)),
            _ => Ok(Self::User(index)),
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind().prefix(), self.index())
    }
}

impl FromStr for SourceId {
    type Err = AttributionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_token(s)
    }
}

impl Serialize for SourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
