//! Catalog records as seen by the pipeline, and the wire shapes they are
//! decoded from.
//!
//! Only presence is checked: missing or `null` fields become `None`/empty
//! instead of failing the decode.

use std::collections::HashMap;

use bestiary_shared::CatalogId;
use serde::{Deserialize, Deserializer};

/// A monster returned by the name search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonsterSummary {
    pub id: Option<CatalogId>,
    /// Name in the configured locale.
    pub name: Option<String>,
    pub race: Option<CatalogId>,
    pub subareas: Vec<CatalogId>,
}

/// An entry of the dungeon listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DungeonSummary {
    pub id: Option<CatalogId>,
    pub name: Option<String>,
}

/// A single dungeon with its member monsters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dungeon {
    pub name: Option<String>,
    pub monsters: Vec<CatalogId>,
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// `{"fr": "...", "en": "...", ...}`
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub(crate) struct LocalizedText(HashMap<String, serde_json::Value>);

impl LocalizedText {
    pub(crate) fn get(&self, locale: &str) -> Option<String> {
        self.0
            .get(locale)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    }
}

fn localized(text: Option<&LocalizedText>, locale: &str) -> Option<String> {
    text.and_then(|t| t.get(locale))
}

/// Missing or `null` list → empty list.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Paged list envelope (`{"data": [...], "total": .., ...}`).
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Page<T> {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMonster {
    #[serde(default)]
    id: Option<CatalogId>,
    #[serde(default)]
    name: Option<LocalizedText>,
    #[serde(default)]
    race: Option<CatalogId>,
    #[serde(default, deserialize_with = "null_as_empty")]
    subareas: Vec<CatalogId>,
}

impl RawMonster {
    pub(crate) fn localize(self, locale: &str) -> MonsterSummary {
        MonsterSummary {
            id: self.id,
            name: localized(self.name.as_ref(), locale),
            race: self.race,
            subareas: self.subareas,
        }
    }
}

/// Races and subareas: only the name is consumed.
#[derive(Debug, Deserialize)]
pub(crate) struct RawNamed {
    #[serde(default)]
    name: Option<LocalizedText>,
}

impl RawNamed {
    pub(crate) fn localize(self, locale: &str) -> Option<String> {
        localized(self.name.as_ref(), locale)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDungeon {
    #[serde(default)]
    id: Option<CatalogId>,
    #[serde(default)]
    name: Option<LocalizedText>,
    #[serde(default, deserialize_with = "null_as_empty")]
    monsters: Vec<CatalogId>,
}

impl RawDungeon {
    pub(crate) fn summary(self, locale: &str) -> DungeonSummary {
        DungeonSummary {
            id: self.id,
            name: localized(self.name.as_ref(), locale),
        }
    }

    pub(crate) fn localize(self, locale: &str) -> Dungeon {
        Dungeon {
            name: localized(self.name.as_ref(), locale),
            monsters: self.monsters,
        }
    }
}
