//! Source name → catalog monster matching.

use bestiary_catalog::{CatalogApi, MonsterSummary};
use bestiary_shared::Result;
use tracing::{debug, instrument};

use crate::variants::name_variants;

/// Result of looking a source name up in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A query returned at least one monster; the first one is kept.
    Found {
        monster: MonsterSummary,
        /// The exact name or variant that produced the match.
        matched_name: String,
        /// How many monsters that query returned.
        candidates: usize,
    },
    /// Neither the exact name nor any variant matched.
    NotFound { variants_tried: usize },
}

/// Find the catalog monster for `name`.
///
/// The exact name is queried first and, when it matches, no variant is ever
/// generated. Otherwise each capitalization variant is queried in turn until
/// one matches; a failing variant query is skipped. Only a failure of the
/// exact-name query is returned as an error.
#[instrument(skip(api))]
pub async fn find_monster<C: CatalogApi>(api: &C, name: &str) -> Result<MatchOutcome> {
    let direct = api.search_monsters(name).await?;
    if let Some(outcome) = first_match(direct, name) {
        return Ok(outcome);
    }

    let variants = name_variants(name);
    debug!(count = variants.len(), "exact name missed, trying variants");

    for variant in &variants {
        match api.search_monsters(variant).await {
            Ok(found) => {
                if let Some(outcome) = first_match(found, variant) {
                    debug!(%variant, "variant matched");
                    return Ok(outcome);
                }
            }
            Err(e) => {
                debug!(%variant, error = %e, "variant query failed, trying next");
            }
        }
    }

    Ok(MatchOutcome::NotFound {
        variants_tried: variants.len(),
    })
}

fn first_match(found: Vec<MonsterSummary>, queried: &str) -> Option<MatchOutcome> {
    let candidates = found.len();
    found
        .into_iter()
        .next()
        .map(|monster| MatchOutcome::Found {
            monster,
            matched_name: queried.to_string(),
            candidates,
        })
}
