//! In-memory [`CatalogApi`] for unit tests, recording every call.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};

use bestiary_catalog::{CatalogApi, Dungeon, DungeonSummary, MonsterSummary};
use bestiary_shared::{BestiaryError, CatalogId, Result};

#[derive(Default)]
pub(crate) struct FakeCatalog {
    monsters: HashMap<String, Vec<MonsterSummary>>,
    failing_searches: HashSet<String>,
    races: HashMap<CatalogId, Option<String>>,
    failing_races: HashSet<CatalogId>,
    races_failing_once: RefCell<HashSet<CatalogId>>,
    subareas: HashMap<CatalogId, Option<String>>,
    failing_subareas: HashSet<CatalogId>,
    dungeons: BTreeMap<CatalogId, Dungeon>,
    failing_dungeons: HashSet<CatalogId>,
    listing_fails: bool,

    searches: RefCell<Vec<String>>,
    race_calls: RefCell<Vec<CatalogId>>,
    subarea_calls: RefCell<Vec<CatalogId>>,
    dungeon_calls: RefCell<Vec<CatalogId>>,
    listing_calls: Cell<usize>,
}

fn not_found(what: &str, id: CatalogId) -> BestiaryError {
    BestiaryError::Network(format!("/{what}/{id}: HTTP 404 Not Found"))
}

impl FakeCatalog {
    pub(crate) fn with_monsters(mut self, name: &str, found: Vec<MonsterSummary>) -> Self {
        self.monsters.insert(name.to_string(), found);
        self
    }

    pub(crate) fn failing_search(mut self, name: &str) -> Self {
        self.failing_searches.insert(name.to_string());
        self
    }

    pub(crate) fn with_race(mut self, id: CatalogId, name: Option<&str>) -> Self {
        self.races.insert(id, name.map(str::to_string));
        self
    }

    pub(crate) fn failing_race(mut self, id: CatalogId) -> Self {
        self.failing_races.insert(id);
        self
    }

    pub(crate) fn failing_race_once(self, id: CatalogId) -> Self {
        self.races_failing_once.borrow_mut().insert(id);
        self
    }

    pub(crate) fn with_subarea(mut self, id: CatalogId, name: Option<&str>) -> Self {
        self.subareas.insert(id, name.map(str::to_string));
        self
    }

    pub(crate) fn failing_subarea(mut self, id: CatalogId) -> Self {
        self.failing_subareas.insert(id);
        self
    }

    pub(crate) fn with_dungeon(
        mut self,
        id: CatalogId,
        name: Option<&str>,
        monsters: Vec<CatalogId>,
    ) -> Self {
        self.dungeons.insert(
            id,
            Dungeon {
                name: name.map(str::to_string),
                monsters,
            },
        );
        self
    }

    pub(crate) fn failing_dungeon(mut self, id: CatalogId) -> Self {
        self.failing_dungeons.insert(id);
        self
    }

    pub(crate) fn failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub(crate) fn searches(&self) -> Vec<String> {
        self.searches.borrow().clone()
    }

    pub(crate) fn race_calls(&self) -> Vec<CatalogId> {
        self.race_calls.borrow().clone()
    }

    pub(crate) fn subarea_calls(&self) -> Vec<CatalogId> {
        self.subarea_calls.borrow().clone()
    }

    pub(crate) fn dungeon_calls(&self) -> Vec<CatalogId> {
        self.dungeon_calls.borrow().clone()
    }

    pub(crate) fn listing_calls(&self) -> usize {
        self.listing_calls.get()
    }
}

impl CatalogApi for FakeCatalog {
    async fn search_monsters(&self, name: &str) -> Result<Vec<MonsterSummary>> {
        self.searches.borrow_mut().push(name.to_string());
        if self.failing_searches.contains(name) {
            return Err(BestiaryError::Network(format!("/monsters?name={name}: timed out")));
        }
        Ok(self.monsters.get(name).cloned().unwrap_or_default())
    }

    async fn race_name(&self, id: CatalogId) -> Result<Option<String>> {
        self.race_calls.borrow_mut().push(id);
        if self.failing_races.contains(&id) || self.races_failing_once.borrow_mut().remove(&id) {
            return Err(BestiaryError::Network(format!("/monster-races/{id}: HTTP 502")));
        }
        self.races
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("monster-races", id))
    }

    async fn subarea_name(&self, id: CatalogId) -> Result<Option<String>> {
        self.subarea_calls.borrow_mut().push(id);
        if self.failing_subareas.contains(&id) {
            return Err(BestiaryError::Network(format!("/subareas/{id}: HTTP 500")));
        }
        self.subareas
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("subareas", id))
    }

    async fn list_dungeons(&self) -> Result<Vec<DungeonSummary>> {
        self.listing_calls.set(self.listing_calls.get() + 1);
        if self.listing_fails {
            return Err(BestiaryError::Network("/dungeons: HTTP 503".into()));
        }
        Ok(self
            .dungeons
            .iter()
            .map(|(id, d)| DungeonSummary {
                id: Some(*id),
                name: d.name.clone(),
            })
            .collect())
    }

    async fn dungeon(&self, id: CatalogId) -> Result<Dungeon> {
        self.dungeon_calls.borrow_mut().push(id);
        if self.failing_dungeons.contains(&id) {
            return Err(BestiaryError::Network(format!("/dungeons/{id}: HTTP 500")));
        }
        self.dungeons
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("dungeons", id))
    }
}
