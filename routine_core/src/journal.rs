//! Import journal.
//!
//! Every committed import is appended to a JSONL (JSON Lines) file with file
//! locking, so the history of what was copied where survives the session.

use crate::importer::ImportSummary;
use crate::Result;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name of the journal inside the data directory
pub const JOURNAL_FILE: &str = "imports.jsonl";

/// One committed import
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub imported_at: DateTime<Utc>,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub summary: ImportSummary,
}

impl JournalEntry {
    pub fn new(source: &Path, destination: &Path, summary: ImportSummary) -> Self {
        Self {
            id: Uuid::new_v4(),
            imported_at: Utc::now(),
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            summary,
        }
    }
}

/// Journal sink trait for recording imports
pub trait JournalSink {
    fn append(&mut self, entry: &JournalEntry) -> Result<()>;
}

/// JSONL-based journal with file locking
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Journal at its standard location inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(JOURNAL_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl JournalSink for JsonlJournal {
    fn append(&mut self, entry: &JournalEntry) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended import {} to journal", entry.id);
        Ok(())
    }
}

/// Read all entries from a journal file, skipping lines that fail to parse
#[cfg(test)]
fn read_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<JournalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse journal entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} entries from journal", entries.len());
    Ok(entries)
}
