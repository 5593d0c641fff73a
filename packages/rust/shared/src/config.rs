//! Application configuration for Bestiary.
//!
//! The config file lives next to the executable as `bestiary.toml`.
//! CLI flags override config file values, which override defaults. Relative
//! file paths are resolved against the executable's directory too, so a run
//! needs neither flags nor environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BestiaryError, Result};
use crate::types::CatalogId;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "bestiary.toml";

/// Upper bound on the number of ids in `[dungeons]` range mode.
pub const MAX_DUNGEON_SPAN: CatalogId = 100_000;

// ---------------------------------------------------------------------------
// Config structs (matching bestiary.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// External catalog settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Dungeon pass settings.
    #[serde(default)]
    pub dungeons: DungeonsConfig,

    /// Input/output file locations.
    #[serde(default)]
    pub files: FilesConfig,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root URL of the external catalog.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Language key used for name lookups and localized fields.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Page size requested when listing dungeons.
    #[serde(default = "default_dungeon_list_limit")]
    pub dungeon_list_limit: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            locale: default_locale(),
            timeout_secs: default_timeout_secs(),
            dungeon_list_limit: default_dungeon_list_limit(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.dofusdb.fr".into()
}
fn default_locale() -> String {
    "fr".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_dungeon_list_limit() -> u32 {
    500
}

/// `[dungeons]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DungeonsConfig {
    /// First dungeon id scanned (inclusive).
    #[serde(default = "default_first_dungeon_id")]
    pub first_id: CatalogId,

    /// Last dungeon id scanned (inclusive).
    #[serde(default = "default_last_dungeon_id")]
    pub last_id: CatalogId,

    /// Scan the ids returned by the dungeon listing instead of the range.
    #[serde(default)]
    pub from_listing: bool,
}

impl Default for DungeonsConfig {
    fn default() -> Self {
        Self {
            first_id: default_first_dungeon_id(),
            last_id: default_last_dungeon_id(),
            from_listing: false,
        }
    }
}

fn default_first_dungeon_id() -> CatalogId {
    1
}
fn default_last_dungeon_id() -> CatalogId {
    187
}

impl DungeonsConfig {
    /// The id source the dungeon pass should iterate.
    pub fn range(&self) -> DungeonRange {
        if self.from_listing {
            DungeonRange::FromListing
        } else {
            DungeonRange::Inclusive {
                first: self.first_id,
                last: self.last_id,
            }
        }
    }
}

/// Which dungeon ids the dungeon pass visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DungeonRange {
    /// A fixed inclusive id range.
    Inclusive { first: CatalogId, last: CatalogId },
    /// The ids present in the live dungeon listing.
    FromListing,
}

/// `[files]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Source monster list (JSON array).
    #[serde(default = "default_input")]
    pub input: String,

    /// Enriched monster list (pretty JSON array).
    #[serde(default = "default_output")]
    pub output: String,

    /// Error log (CSV).
    #[serde(default = "default_errors")]
    pub errors: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            errors: default_errors(),
        }
    }
}

fn default_input() -> String {
    "monsters_originel.json".into()
}
fn default_output() -> String {
    "monsters.json".into()
}
fn default_errors() -> String {
    "erreurs.csv".into()
}

/// File locations after resolution against a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub errors: PathBuf,
}

impl FilesConfig {
    /// Resolve relative paths against `base`. Absolute paths are kept as-is.
    pub fn resolve(&self, base: &Path) -> ResolvedPaths {
        ResolvedPaths {
            input: base.join(&self.input),
            output: base.join(&self.output),
            errors: base.join(&self.errors),
        }
    }
}

impl AppConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api.base_url).map_err(|e| {
            BestiaryError::validation(format!("invalid api.base_url '{}': {e}", self.api.base_url))
        })?;

        if self.api.locale.trim().is_empty() {
            return Err(BestiaryError::validation("api.locale must not be empty"));
        }

        if self.api.timeout_secs == 0 {
            return Err(BestiaryError::validation("api.timeout_secs must be positive"));
        }

        if !self.dungeons.from_listing && self.dungeons.last_id < self.dungeons.first_id {
            return Err(BestiaryError::validation(format!(
                "dungeons.last_id ({}) is lower than dungeons.first_id ({})",
                self.dungeons.last_id, self.dungeons.first_id
            )));
        }

        if !self.dungeons.from_listing
            && self.dungeons.last_id.saturating_sub(self.dungeons.first_id) >= MAX_DUNGEON_SPAN
        {
            return Err(BestiaryError::validation(format!(
                "dungeons range {}..={} spans more than {MAX_DUNGEON_SPAN} ids; \
                 narrow it or set from_listing = true",
                self.dungeons.first_id, self.dungeons.last_id
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Directory containing the running executable.
pub fn base_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| BestiaryError::config(format!("could not locate executable: {e}")))?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| BestiaryError::config("executable has no parent directory"))
}

/// Get the path to the config file (`<exe dir>/bestiary.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(base_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BestiaryError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        BestiaryError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Write a default config file at `path`.
/// Returns the path to the created file.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| BestiaryError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BestiaryError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| BestiaryError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}
