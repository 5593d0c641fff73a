//! End-to-end enrichment run: source file → per-monster pass → dungeon pass
//! → enriched file, with failures streamed to the error log.

use std::io::Write;
use std::time::{Duration, Instant};

use bestiary_catalog::{CatalogApi, MonsterSummary};
use bestiary_shared::{
    CatalogId, DungeonRange, EnrichedMonster, ErrorKind, ErrorRecord, ResolvedPaths, Result,
    SourceMonster,
};
use bestiary_storage::ErrorLog;
use tracing::{debug, info, instrument, warn};

use crate::dungeons::{DungeonReport, assign_dungeons};
use crate::matcher::{MatchOutcome, find_monster};
use crate::resolver::{CacheStats, ReferenceKind, ReferenceResolver};

/// Details column of `NotFound` rows, kept as readers of the log know it.
pub const NOT_FOUND_DETAILS: &str = "Aucun résultat API";

/// Configuration for [`run`].
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Input, output and error-log locations.
    pub paths: ResolvedPaths,
    /// Dungeon ids visited by the dungeon pass.
    pub dungeons: DungeonRange,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Records read and written.
    pub monsters: usize,
    pub matched: usize,
    pub not_found: usize,
    pub api_errors: usize,
    pub race_errors: usize,
    pub subarea_errors: usize,
    pub race_cache: CacheStats,
    pub subarea_cache: CacheStats,
    pub dungeons: DungeonReport,
    /// Records with at least one dungeon after the dungeon pass.
    pub with_dungeons: usize,
    pub elapsed: Duration,
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each source record is emitted.
    fn monster_processed(&self, name: &str, current: usize, total: usize);
    /// Called before each dungeon fetch.
    fn dungeon_scanned(&self, id: CatalogId, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn monster_processed(&self, _name: &str, _current: usize, _total: usize) {}
    fn dungeon_scanned(&self, _id: CatalogId, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// How the per-monster pass ended for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Matched; race and zones may still be partial.
    Matched,
    /// No catalog entry for the name or any variant.
    NotFound,
    /// The name search failed; nothing was resolved.
    ApiError,
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

/// Per-monster enrichment with its own race and subarea caches.
///
/// One `Enricher` is one run: caches live exactly as long as it does.
pub struct Enricher<'a, C> {
    api: &'a C,
    races: ReferenceResolver,
    subareas: ReferenceResolver,
}

impl<'a, C: CatalogApi> Enricher<'a, C> {
    pub fn new(api: &'a C) -> Self {
        Self {
            api,
            races: ReferenceResolver::new(ReferenceKind::Race),
            subareas: ReferenceResolver::new(ReferenceKind::Subarea),
        }
    }

    /// Enrich one record. Always yields a record; failures go to `errors`.
    ///
    /// Only a failure to write the error log is returned as an error.
    pub async fn enrich<W: Write>(
        &mut self,
        source: &SourceMonster,
        errors: &mut ErrorLog<W>,
    ) -> Result<(EnrichedMonster, RecordOutcome)> {
        let mut entry = EnrichedMonster::unresolved(source);

        let outcome = match find_monster(self.api, &source.name).await {
            Ok(MatchOutcome::Found {
                monster,
                matched_name,
                candidates,
            }) => {
                debug!(name = %source.name, %matched_name, candidates, "matched");
                self.resolve_matched(source, monster, &mut entry, errors)
                    .await?;
                RecordOutcome::Matched
            }
            Ok(MatchOutcome::NotFound { variants_tried }) => {
                debug!(name = %source.name, variants_tried, "no catalog match");
                errors.record(&ErrorRecord::new(
                    source,
                    ErrorKind::NotFound,
                    NOT_FOUND_DETAILS,
                ))?;
                RecordOutcome::NotFound
            }
            Err(e) => {
                warn!(name = %source.name, error = %e, "monster search failed");
                errors.record(&ErrorRecord::new(
                    source,
                    ErrorKind::MonsterApiError,
                    e.to_string(),
                ))?;
                RecordOutcome::ApiError
            }
        };

        Ok((entry, outcome))
    }

    async fn resolve_matched<W: Write>(
        &mut self,
        source: &SourceMonster,
        monster: MonsterSummary,
        entry: &mut EnrichedMonster,
        errors: &mut ErrorLog<W>,
    ) -> Result<()> {
        // Catalog spelling replaces the local one.
        if let Some(name) = monster.name.filter(|n| !n.is_empty()) {
            entry.name = name;
        }
        entry.external_id = monster.id;

        if let Some(race_id) = monster.race {
            match self.races.resolve(self.api, race_id).await {
                Ok(family) => entry.family = family,
                Err(e) => {
                    warn!(name = %source.name, race_id, error = %e, "race lookup failed");
                    errors.record(&ErrorRecord::new(
                        source,
                        ErrorKind::RaceError,
                        e.to_string(),
                    ))?;
                }
            }
        }

        for subarea_id in monster.subareas {
            match self.subareas.resolve(self.api, subarea_id).await {
                Ok(Some(zone)) if !zone.is_empty() => {
                    entry.zones.insert(zone);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(name = %source.name, subarea_id, error = %e, "subarea lookup failed");
                    errors.record(&ErrorRecord::new(
                        source,
                        ErrorKind::SubareaError,
                        format!("{subarea_id}: {e}"),
                    ))?;
                }
            }
        }

        Ok(())
    }

    /// Enrich every record in order, one output per input.
    pub async fn enrich_all<W: Write>(
        &mut self,
        sources: &[SourceMonster],
        errors: &mut ErrorLog<W>,
        progress: &dyn ProgressReporter,
    ) -> Result<(Vec<EnrichedMonster>, Vec<RecordOutcome>)> {
        let total = sources.len();
        let mut enriched = Vec::with_capacity(total);
        let mut outcomes = Vec::with_capacity(total);

        for (i, source) in sources.iter().enumerate() {
            let (entry, outcome) = self.enrich(source, errors).await?;
            progress.monster_processed(&entry.name, i + 1, total);
            enriched.push(entry);
            outcomes.push(outcome);
        }

        Ok((enriched, outcomes))
    }

    pub fn race_stats(&self) -> CacheStats {
        self.races.stats()
    }

    pub fn subarea_stats(&self) -> CacheStats {
        self.subareas.stats()
    }
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

/// Run the whole enrichment job.
///
/// 1. Read the source list and open the error log (failures abort)
/// 2. Per-monster pass: match, resolve race and zones
/// 3. Dungeon pass over the full collection
/// 4. Write the enriched list (failure aborts)
#[instrument(skip_all, fields(input = %config.paths.input.display()))]
pub async fn run<C: CatalogApi>(
    config: &RunConfig,
    api: &C,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();

    progress.phase("Loading source monsters");
    let sources = bestiary_storage::read_source_monsters(&config.paths.input)?;
    let mut errors = ErrorLog::create(&config.paths.errors)?;

    info!(count = sources.len(), "starting enrichment");

    progress.phase("Enriching monsters");
    let mut enricher = Enricher::new(api);
    let (mut enriched, outcomes) = enricher.enrich_all(&sources, &mut errors, progress).await?;

    progress.phase("Assigning dungeons");
    let dungeons = assign_dungeons(api, &mut enriched, config.dungeons, progress).await;

    progress.phase("Writing enriched monsters");
    bestiary_storage::write_enriched(&config.paths.output, &enriched)?;

    let count = |wanted: RecordOutcome| outcomes.iter().filter(|o| **o == wanted).count();
    let summary = RunSummary {
        monsters: enriched.len(),
        matched: count(RecordOutcome::Matched),
        not_found: count(RecordOutcome::NotFound),
        api_errors: count(RecordOutcome::ApiError),
        race_errors: errors.count(ErrorKind::RaceError),
        subarea_errors: errors.count(ErrorKind::SubareaError),
        race_cache: enricher.race_stats(),
        subarea_cache: enricher.subarea_stats(),
        dungeons,
        with_dungeons: enriched.iter().filter(|m| m.dungeons.is_some()).count(),
        elapsed: start.elapsed(),
    };

    info!(
        monsters = summary.monsters,
        matched = summary.matched,
        not_found = summary.not_found,
        api_errors = summary.api_errors,
        logged_errors = errors.total(),
        elapsed_ms = summary.elapsed.as_millis(),
        "enrichment completed"
    );

    progress.done(&summary);
    Ok(summary)
}
