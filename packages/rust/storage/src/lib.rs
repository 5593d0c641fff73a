//! Flat-file storage for an enrichment run.
//!
//! - the source monster list is read once, up front
//! - the [`ErrorLog`] CSV is written row by row and flushed after every row,
//!   so a crash mid-run still leaves every failure recorded
//! - the enriched list is written once, at the end

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bestiary_shared::{
    BestiaryError, EnrichedMonster, ErrorKind, ErrorRecord, Result, SourceMonster,
};
use tracing::{debug, info};

/// CSV header of the error log.
pub const ERROR_LOG_HEADER: [&str; 4] = ["id", "name", "error", "details"];

// ---------------------------------------------------------------------------
// JSON files
// ---------------------------------------------------------------------------

/// Read the source monster list (a JSON array).
pub fn read_source_monsters(path: &Path) -> Result<Vec<SourceMonster>> {
    let file = File::open(path).map_err(|e| BestiaryError::io(path, e))?;
    let monsters: Vec<SourceMonster> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| BestiaryError::parse(format!("{}: {e}", path.display())))?;

    info!(path = %path.display(), count = monsters.len(), "loaded source monsters");
    Ok(monsters)
}

/// Write the enriched list as pretty-printed UTF-8 JSON.
///
/// Non-ASCII characters are written literally.
pub fn write_enriched(path: &Path, monsters: &[EnrichedMonster]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BestiaryError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| BestiaryError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, monsters)
        .map_err(|e| BestiaryError::Storage(format!("{}: {e}", path.display())))?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|e| BestiaryError::io(path, e))?;

    info!(path = %path.display(), count = monsters.len(), "wrote enriched monsters");
    Ok(())
}

// ---------------------------------------------------------------------------
// ErrorLog
// ---------------------------------------------------------------------------

/// Append-only CSV log of per-monster failures.
pub struct ErrorLog<W: Write> {
    writer: csv::Writer<W>,
    counts: HashMap<ErrorKind, usize>,
}

impl ErrorLog<File> {
    /// Create (or truncate) the error log at `path` and write its header.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BestiaryError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| BestiaryError::io(path, e))?;
        Self::from_writer(file)
    }
}

impl<W: Write> ErrorLog<W> {
    /// Wrap any writer. The header is written immediately.
    pub fn from_writer(inner: W) -> Result<Self> {
        // Rows are serialized without serde-derived headers so the header
        // exists even when no failure is ever recorded.
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        writer
            .write_record(ERROR_LOG_HEADER)
            .map_err(|e| BestiaryError::Storage(format!("error log header: {e}")))?;
        writer
            .flush()
            .map_err(|e| BestiaryError::Storage(format!("error log flush: {e}")))?;

        Ok(Self {
            writer,
            counts: HashMap::new(),
        })
    }

    /// Append one row and flush it.
    pub fn record(&mut self, record: &ErrorRecord) -> Result<()> {
        debug!(id = %record.id, name = %record.name, error = %record.error, "logging failure");

        self.writer
            .serialize(record)
            .map_err(|e| BestiaryError::Storage(format!("error log row: {e}")))?;
        self.writer
            .flush()
            .map_err(|e| BestiaryError::Storage(format!("error log flush: {e}")))?;

        *self.counts.entry(record.error).or_default() += 1;
        Ok(())
    }

    /// Rows written so far for `kind`.
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Rows written so far.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| BestiaryError::Storage(format!("error log flush: {}", e.error())))
    }
}
