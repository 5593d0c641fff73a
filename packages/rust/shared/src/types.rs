//! Domain records for the enrichment run.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric identifier used by the external catalog (monsters, races,
/// subareas, dungeons). Signed: the catalog is not trusted to keep ids
/// positive, and a negative id must not fail a whole response.
pub type CatalogId = i64;

// ---------------------------------------------------------------------------
// MonsterId
// ---------------------------------------------------------------------------

/// Identifier of a record in the local source file, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonsterId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MonsterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// SourceMonster
// ---------------------------------------------------------------------------

/// One entry of the local source file. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMonster {
    pub id: MonsterId,
    pub name: String,
    #[serde(default)]
    pub step: serde_json::Value,
    #[serde(rename = "type", default)]
    pub kind: serde_json::Value,
}

// ---------------------------------------------------------------------------
// EnrichedMonster
// ---------------------------------------------------------------------------

/// A source record plus the metadata resolved from the external catalog.
///
/// Serialized keys follow the historical output format (`id_DB`, `famille`,
/// `donjon`) so downstream consumers keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedMonster {
    pub id: MonsterId,
    pub name: String,
    pub step: serde_json::Value,
    #[serde(rename = "type")]
    pub kind: serde_json::Value,
    /// Catalog id of the matched monster.
    #[serde(rename = "id_DB")]
    pub external_id: Option<CatalogId>,
    /// Localized race name.
    #[serde(rename = "famille")]
    pub family: Option<String>,
    /// Localized subarea names, sorted.
    pub zones: BTreeSet<String>,
    /// Dungeon names in discovery order; `None` until the dungeon pass
    /// assigns one.
    #[serde(rename = "donjon")]
    pub dungeons: Option<Vec<String>>,
}

impl EnrichedMonster {
    /// The record emitted when nothing could be resolved.
    pub fn unresolved(source: &SourceMonster) -> Self {
        Self {
            id: source.id.clone(),
            name: source.name.clone(),
            step: source.step.clone(),
            kind: source.kind.clone(),
            external_id: None,
            family: None,
            zones: BTreeSet::new(),
            dungeons: None,
        }
    }

    /// Record membership of `dungeon`, dropping it from `zones`.
    ///
    /// Returns `true` when the name was not already listed.
    pub fn assign_dungeon(&mut self, dungeon: &str) -> bool {
        let dungeons = self.dungeons.get_or_insert_with(Vec::new);
        let added = if dungeons.iter().any(|d| d == dungeon) {
            false
        } else {
            dungeons.push(dungeon.to_string());
            true
        };
        self.zones.remove(dungeon);
        added
    }
}

// ---------------------------------------------------------------------------
// Error log records
// ---------------------------------------------------------------------------

/// Failure categories written to the `error` column of the error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No catalog match after the exact name and every variant.
    NotFound,
    /// The race lookup failed.
    RaceError,
    /// One subarea lookup failed.
    SubareaError,
    /// The name search itself failed.
    #[serde(rename = "MonsterAPIError")]
    MonsterApiError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::RaceError => "RaceError",
            Self::SubareaError => "SubareaError",
            Self::MonsterApiError => "MonsterAPIError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the error log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: MonsterId,
    pub name: String,
    pub error: ErrorKind,
    pub details: String,
}

impl ErrorRecord {
    pub fn new(source: &SourceMonster, error: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            id: source.id.clone(),
            name: source.name.clone(),
            error,
            details: details.into(),
        }
    }
}
