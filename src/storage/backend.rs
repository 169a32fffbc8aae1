//! Storage backend trait and implementations.
//!
//! - `FileBackend` - `records.json` inside a data directory (default)
//! - `MemoryBackend` - in-process JSON text, for tests and embedding

use super::Record;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Records keyed by name.
pub type RecordMap = BTreeMap<String, Record>;

/// Trait for storage backends that handle raw record persistence.
///
/// Backends persist each record's preference mapping verbatim; validation
/// happens in [`super::Storage`].
pub trait StorageBackend: Send + Sync {
    /// Read every stored record. A backend with nothing stored yet returns an empty map.
    fn read_records(&self) -> Result<RecordMap>;

    /// Replace the stored records.
    fn write_records(&mut self, records: &RecordMap) -> Result<()>;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;

    /// Get the backend type.
    fn backend_type(&self) -> BackendType;
}

/// Available storage backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    File,
    Memory,
}

impl BackendType {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stores records as pretty-printed JSON in `<dir>/records.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub const FILE_NAME: &'static str = "records.json";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(Self::FILE_NAME)
    }
}

impl StorageBackend for FileBackend {
    fn read_records(&self) -> Result<RecordMap> {
        let path = self.path();
        if !path.exists() {
            return Ok(RecordMap::new());
        }
        let content = std::fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(RecordMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_records(&mut self, records: &RecordMap) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        // Write next to the target so the rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, records)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path()).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path().display().to_string()
    }

    fn backend_type(&self) -> BackendType {
        BackendType::File
    }
}

/// Keeps the serialized records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    content: Option<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing JSON text, as if it had been written earlier.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }

    /// The last written JSON text, if any.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

impl StorageBackend for MemoryBackend {
    fn read_records(&self) -> Result<RecordMap> {
        match &self.content {
            Some(content) => Ok(serde_json::from_str(content)?),
            None => Ok(RecordMap::new()),
        }
    }

    fn write_records(&mut self, records: &RecordMap) -> Result<()> {
        self.content = Some(serde_json::to_string(records)?);
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Memory
    }
}
