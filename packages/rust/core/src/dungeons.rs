//! Reverse dungeon → monster assignment.
//!
//! Monster records from the catalog carry no dungeon field, so membership is
//! recovered by walking dungeons and back-filling each member monster that
//! the enrichment pass matched. Only records with an external id are
//! reachable; the others keep `dungeons = None`.

use std::collections::HashMap;

use bestiary_catalog::CatalogApi;
use bestiary_shared::{CatalogId, DungeonRange, EnrichedMonster};
use tracing::{debug, info, instrument, warn};

use crate::pipeline::ProgressReporter;

/// What a dungeon pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DungeonReport {
    /// Size of the dungeon listing, when it could be fetched.
    pub listed: Option<usize>,
    /// Dungeon ids visited.
    pub visited: usize,
    /// Dungeons without a localized name or without members.
    pub skipped: usize,
    /// Dungeon fetches that failed.
    pub failed: usize,
    /// New (monster, dungeon) pairs recorded.
    pub assignments: usize,
}

/// Assign dungeon names to the matched monsters in `monsters`.
///
/// Every dungeon name attached to a monster is removed from its zones. The
/// pass is idempotent: running it again adds nothing. A failing dungeon is
/// logged and skipped; nothing here aborts the run.
#[instrument(skip_all, fields(range = ?range))]
pub async fn assign_dungeons<C: CatalogApi>(
    api: &C,
    monsters: &mut [EnrichedMonster],
    range: DungeonRange,
    progress: &dyn ProgressReporter,
) -> DungeonReport {
    let mut report = DungeonReport::default();

    // Later records win when two share an external id.
    let lookup: HashMap<CatalogId, usize> = monsters
        .iter()
        .enumerate()
        .filter_map(|(idx, m)| m.external_id.map(|id| (id, idx)))
        .collect();

    let listing = match api.list_dungeons().await {
        Ok(listing) => {
            info!(count = listing.len(), "dungeons listed");
            Some(listing)
        }
        Err(e) => {
            warn!(error = %e, "dungeon listing failed");
            None
        }
    };
    report.listed = listing.as_ref().map(Vec::len);

    let listed_ids: Vec<CatalogId> = {
        let mut ids: Vec<CatalogId> = listing.iter().flatten().filter_map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    };

    // Range mode is iterated lazily; only the listing is materialized.
    let (ids, total): (Box<dyn Iterator<Item = CatalogId> + Send>, usize) = match range {
        DungeonRange::Inclusive { first, last } => {
            let outside = listed_ids
                .iter()
                .filter(|id| **id < first || **id > last)
                .count();
            if outside > 0 {
                warn!(
                    outside,
                    first, last, "listed dungeons fall outside the configured id range"
                );
            }
            let total =
                usize::try_from(last.saturating_sub(first).saturating_add(1)).unwrap_or(0);
            (Box::new(first..=last), total)
        }
        DungeonRange::FromListing => {
            let total = listed_ids.len();
            (Box::new(listed_ids.into_iter()), total)
        }
    };

    for (i, id) in ids.enumerate() {
        progress.dungeon_scanned(id, i + 1, total);
        report.visited += 1;

        let dungeon = match api.dungeon(id).await {
            Ok(dungeon) => dungeon,
            Err(e) => {
                warn!(dungeon_id = id, error = %e, "dungeon fetch failed, continuing");
                report.failed += 1;
                continue;
            }
        };

        let name = match dungeon.name {
            Some(name) if !name.is_empty() && !dungeon.monsters.is_empty() => name,
            _ => {
                debug!(dungeon_id = id, "dungeon without name or members, skipping");
                report.skipped += 1;
                continue;
            }
        };

        for member in &dungeon.monsters {
            if let Some(&idx) = lookup.get(member) {
                if monsters[idx].assign_dungeon(&name) {
                    report.assignments += 1;
                }
            }
        }
    }

    info!(
        visited = report.visited,
        skipped = report.skipped,
        failed = report.failed,
        assignments = report.assignments,
        "dungeon pass completed"
    );

    report
}
