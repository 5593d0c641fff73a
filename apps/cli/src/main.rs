//! Bestiary CLI: enrich the local monster list from the DofusDB catalog.
//!
//! Reads the source monster file, matches every record against the catalog,
//! and writes the enriched list plus a CSV log of everything that failed.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
