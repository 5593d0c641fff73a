//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use bestiary_catalog::DofusDbClient;
use bestiary_core::pipeline::{ProgressReporter, RunConfig, RunSummary};
use bestiary_shared::{
    AppConfig, CatalogId, base_dir, config_file_path, init_config, load_config, load_config_from,
};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Bestiary: enrich monster records from the DofusDB catalog.
#[derive(Parser)]
#[command(
    name = "bestiary",
    version,
    about = "Enrich the local monster list with catalog ids, families, zones and dungeons.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to bestiary.toml next to the executable).
    #[arg(long, env = "BESTIARY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full enrichment job.
    Run,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Crates whose events the default filter lets through.
const LOG_TARGETS: [&str; 5] = [
    "bestiary",
    "bestiary_core",
    "bestiary_catalog",
    "bestiary_storage",
    "bestiary_shared",
];

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd_run(config_path).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    Ok(match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

async fn cmd_run(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let base = base_dir()?;

    let run_config = RunConfig {
        paths: config.files.resolve(&base),
        dungeons: config.dungeons.range(),
    };
    let api = DofusDbClient::new(&config.api)?;

    info!(
        input = %run_config.paths.input.display(),
        catalog = %config.api.base_url,
        locale = api.locale(),
        "starting bestiary run"
    );

    let reporter = CliProgress::new();
    let summary = bestiary_core::pipeline::run(&run_config, &api, &reporter)
        .await
        .map_err(|e| eyre!("enrichment aborted: {e}"))?;

    print_summary(&summary, &run_config);
    Ok(())
}

fn print_summary(summary: &RunSummary, config: &RunConfig) {
    println!();
    println!("  Enrichment complete");
    println!("  Monsters:   {}", summary.monsters);
    println!("  Matched:    {}", summary.matched);
    println!("  Not found:  {}", summary.not_found);
    println!("  API errors: {}", summary.api_errors);
    println!(
        "  Lookups:    {} race / {} subarea failures",
        summary.race_errors, summary.subarea_errors
    );
    println!(
        "  Caches:     races {} hits / {} misses, subareas {} hits / {} misses",
        summary.race_cache.hits,
        summary.race_cache.misses,
        summary.subarea_cache.hits,
        summary.subarea_cache.misses
    );
    println!(
        "  Dungeons:   {} visited, {} failed, {} monsters assigned",
        summary.dungeons.visited, summary.dungeons.failed, summary.with_dungeons
    );
    println!("  Output:     {}", config.paths.output.display());
    println!("  Errors:     {}", config.paths.errors.display());
    println!("  Time:       {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let target = match config_path {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };
    if target.exists() {
        return Err(eyre!("config file already exists at '{}'", target.display()));
    }
    let path = init_config(&target)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.bar.set_position(0);
        self.bar.set_message(name.to_string());
    }

    fn monster_processed(&self, name: &str, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
        self.bar.set_message(format!("Monster {name}"));
    }

    fn dungeon_scanned(&self, id: CatalogId, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
        self.bar.set_message(format!("Dungeon #{id}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}
