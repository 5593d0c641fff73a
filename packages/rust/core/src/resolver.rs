//! Race and subarea name resolution with per-run caches.

use std::collections::HashMap;

use bestiary_catalog::CatalogApi;
use bestiary_shared::{CatalogId, Result};
use tracing::trace;

/// Which reference table a resolver reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Race,
    Subarea,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Race => "race",
            Self::Subarea => "subarea",
        }
    }
}

/// Resolved names keyed by catalog id. `None` records an id whose lookup
/// succeeded without a name for the locale.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCache {
    entries: HashMap<CatalogId, Option<String>>,
}

impl ReferenceCache {
    pub fn get(&self, id: CatalogId) -> Option<&Option<String>> {
        self.entries.get(&id)
    }

    pub fn insert(&mut self, id: CatalogId, name: Option<String>) {
        self.entries.insert(id, name);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Hit/miss counters of one resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Fetch-and-cache lookup of localized reference names.
///
/// Reference data is assumed immutable for the duration of a run: entries are
/// never invalidated. Failed fetches are not cached, so the next occurrence of
/// the same id retries.
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    kind: ReferenceKind,
    cache: ReferenceCache,
    hits: usize,
    misses: usize,
}

impl ReferenceResolver {
    pub fn new(kind: ReferenceKind) -> Self {
        Self {
            kind,
            cache: ReferenceCache::default(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    /// Localized name for `id`, from the cache or the catalog.
    pub async fn resolve<C: CatalogApi>(
        &mut self,
        api: &C,
        id: CatalogId,
    ) -> Result<Option<String>> {
        if let Some(cached) = self.cache.get(id) {
            self.hits += 1;
            return Ok(cached.clone());
        }

        self.misses += 1;
        trace!(kind = self.kind.as_str(), id, "cache miss");

        let name = match self.kind {
            ReferenceKind::Race => api.race_name(id).await?,
            ReferenceKind::Subarea => api.subarea_name(id).await?,
        };

        self.cache.insert(id, name.clone());
        Ok(name)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeCatalog;

    #[tokio::test]
    async fn second_lookup_hits_cache() {
        let api = FakeCatalog::default().with_race(7, Some("Bouftous"));
        let mut races = ReferenceResolver::new(ReferenceKind::Race);

        assert_eq!(races.resolve(&api, 7).await.unwrap(), Some("Bouftous".into()));
        assert_eq!(races.resolve(&api, 7).await.unwrap(), Some("Bouftous".into()));

        assert_eq!(api.race_calls(), vec![7]);
        assert_eq!(
            races.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[tokio::test]
    async fn missing_name_is_cached() {
        let api = FakeCatalog::default().with_subarea(95, None);
        let mut subareas = ReferenceResolver::new(ReferenceKind::Subarea);

        assert_eq!(subareas.resolve(&api, 95).await.unwrap(), None);
        assert_eq!(subareas.resolve(&api, 95).await.unwrap(), None);

        assert_eq!(api.subarea_calls(), vec![95]);
    }

    #[tokio::test]
    async fn failures_are_retried() {
        let api = FakeCatalog::default()
            .with_race(12, Some("Larves"))
            .failing_race_once(12);
        let mut races = ReferenceResolver::new(ReferenceKind::Race);

        assert!(races.resolve(&api, 12).await.is_err());
        assert_eq!(races.resolve(&api, 12).await.unwrap(), Some("Larves".into()));

        assert_eq!(api.race_calls(), vec![12, 12]);
        assert_eq!(races.stats().entries, 1);
    }

    #[tokio::test]
    async fn caches_are_independent() {
        let api = FakeCatalog::default()
            .with_race(4, Some("Tofus"))
            .with_subarea(4, Some("Astrub"));
        let mut races = ReferenceResolver::new(ReferenceKind::Race);
        let mut subareas = ReferenceResolver::new(ReferenceKind::Subarea);

        assert_eq!(races.resolve(&api, 4).await.unwrap(), Some("Tofus".into()));
        assert_eq!(subareas.resolve(&api, 4).await.unwrap(), Some("Astrub".into()));
        assert_eq!(subareas.kind(), ReferenceKind::Subarea);
    }
}
