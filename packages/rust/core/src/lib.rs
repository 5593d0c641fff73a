//! Enrichment pipeline for the bestiary.
//!
//! Matches local monster names against the catalog, resolves races and zones
//! through per-run caches, back-fills dungeon membership, and drives the
//! whole job through [`pipeline::run`].

pub mod dungeons;
pub mod matcher;
pub mod pipeline;
pub mod resolver;
pub mod variants;

#[cfg(test)]
mod fake;
