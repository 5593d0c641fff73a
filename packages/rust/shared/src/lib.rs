//! Shared types, error model, and configuration for Bestiary.
//!
//! This crate is the foundation depended on by all other Bestiary crates.
//! It provides:
//! - [`BestiaryError`], the unified error type
//! - Domain records ([`SourceMonster`], [`EnrichedMonster`], [`ErrorRecord`])
//! - Configuration ([`AppConfig`], [`DungeonRange`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, AppConfig, CONFIG_FILE_NAME, DungeonRange, DungeonsConfig, FilesConfig,
    MAX_DUNGEON_SPAN, ResolvedPaths, base_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{BestiaryError, Result};
pub use types::{CatalogId, EnrichedMonster, ErrorKind, ErrorRecord, MonsterId, SourceMonster};
