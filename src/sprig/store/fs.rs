use super::{Changeset, DataSource};
use crate::error::{Result, SprigError};
use crate::model::{Draft, Record, RecordId};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const RECORDS_FILENAME: &str = "records.json";

/// Keeps every record in a single JSON array under the data directory.
///
/// Each write reads the file, applies the change and replaces the file through
/// a temporary sibling, so a crash mid-write leaves the previous version intact.
pub struct JsonFileSource {
    root: PathBuf,
}

impl JsonFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records_path(&self) -> PathBuf {
        self.root.join(RECORDS_FILENAME)
    }

    pub fn is_initialized(&self) -> bool {
        self.records_path().exists()
    }

    /// Creates the data directory and an empty record file.
    ///
    /// Returns `false` when the store already existed; existing data is never
    /// overwritten.
    pub fn init(&self) -> Result<bool> {
        if self.is_initialized() {
            return Ok(false);
        }
        self.write(&[])?;
        Ok(true)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }

    fn read(&self) -> Result<Vec<Record>> {
        let path = self.records_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<Record> = serde_json::from_str(&content).map_err(|e| {
            SprigError::Store(format!("Could not parse {}: {}", path.display(), e))
        })?;
        Ok(records)
    }

    fn write(&self, records: &[Record]) -> Result<()> {
        self.ensure_dir()?;
        let path = self.records_path();
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(records)?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        debug!(count = records.len(), path = %path.display(), "records written");
        Ok(())
    }
}

impl DataSource for JsonFileSource {
    fn load(&self) -> Result<Vec<Record>> {
        self.read()
    }

    fn create(&mut self, draft: &Draft) -> Result<RecordId> {
        let mut records = self.read()?;
        let next = records.iter().map(|r| r.id.0).max().unwrap_or(0) + 1;
        let id = RecordId(next);
        records.push(draft.clone().into_record(id));
        self.write(&records)?;
        Ok(id)
    }

    fn commit(&mut self, changes: &Changeset) -> Result<()> {
        let mut records = self.read()?;
        changes.apply_to(&mut records)?;
        self.write(&records)
    }

    fn discard(&mut self, id: RecordId) -> Result<()> {
        let mut records = self.read()?;
        records.retain(|r| r.id != id);
        self.write(&records)
    }
}
