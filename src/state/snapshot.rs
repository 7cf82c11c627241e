//! Published state records and the sink they flow through.
//!
//! Every state change is "published" as a full record (state string plus the
//! attribute set) keyed by slot id. The daemon's sink persists records to a
//! JSON file so they survive restarts and can be merged back into freshly
//! configured slots.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The attribute set published alongside a slot's on/off state.
///
/// This is also exactly what [`crate::slot::Timeslot::restore`] consumes:
/// times are kept as "HH:MM:SS" strings so the file stays human-readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotAttributes {
    pub editable: bool,
    pub enabled: bool,
    pub start: String,
    pub end: String,
}

/// One published state record: the "on"/"off" value plus attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedState {
    pub state: String,
    pub attributes: SlotAttributes,
}

/// Destination for published state records.
///
/// The daemon uses [`FileSink`]; tests substitute a recording sink so
/// assertions can see every publish in order.
pub trait StateSink {
    fn publish(&mut self, id: &str, update: &PublishedState) -> Result<()>;
}

/// Persists published state to a JSON file, one full rewrite per publish.
///
/// The whole record map is rewritten atomically (temp file + rename) so a
/// crash mid-write can never leave a truncated state file behind.
pub struct FileSink {
    path: PathBuf,
    records: BTreeMap<String, PublishedState>,
}

impl FileSink {
    /// Open a sink backed by `path`, loading any existing records.
    ///
    /// A missing file is a normal first run and yields an empty map. An
    /// unreadable or corrupt file is an error; silently discarding previous
    /// state would defeat the restore merge.
    pub fn new(path: PathBuf) -> Result<Self> {
        let records = load_records(&path)?;
        Ok(Self { path, records })
    }

    /// The records currently held by the sink.
    pub fn records(&self) -> &BTreeMap<String, PublishedState> {
        &self.records
    }

    fn write_out(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&self.records)
            .context("Failed to serialize published state")?;

        let dir = self
            .path
            .parent()
            .context("State file path has no parent directory")?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .context("Failed to create temporary state file")?;
        tmp.write_all(json.as_bytes())
            .context("Failed to write temporary state file")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to persist state file {}", self.path.display()))?;
        Ok(())
    }
}

impl StateSink for FileSink {
    fn publish(&mut self, id: &str, update: &PublishedState) -> Result<()> {
        self.records.insert(id.to_string(), update.clone());
        self.write_out()
    }
}

/// Load previously published records from `path`.
pub fn load_records(path: &Path) -> Result<BTreeMap<String, PublishedState>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse state file {}", path.display()))
}

/// In-memory sink that records every publish, in order.
#[cfg(any(test, feature = "testing-support"))]
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub published: Vec<(String, PublishedState)>,
}

#[cfg(any(test, feature = "testing-support"))]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent record published for `id`, if any.
    pub fn last_for(&self, id: &str) -> Option<&PublishedState> {
        self.published.iter().rev().find(|(i, _)| i == id).map(|(_, u)| u)
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl StateSink for RecordingSink {
    fn publish(&mut self, id: &str, update: &PublishedState) -> Result<()> {
        self.published.push((id.to_string(), update.clone()));
        Ok(())
    }
}
