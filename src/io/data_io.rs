use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::io::lock::LockError;
use crate::model::entry::GrowLogEntry;
use crate::model::grow::Grow;
use crate::model::stage::VocabularyError;

pub const GROWS_FILE: &str = "grows.json";
pub const DRAFT_FILE: &str = "draft.json";
pub const CONFIG_FILE: &str = "stagesync.toml";
pub const ENTRIES_DIR: &str = "entries";

/// Error type for data directory I/O
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("no stagesync data directory at {0}")]
    NotADataDir(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize {path}: {source}")]
    SerializeError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not parse stagesync.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("invalid stage configuration: {0}")]
    Vocabulary(#[from] VocabularyError),
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Paths inside a data directory
#[derive(Debug, Clone)]
pub struct DataDir {
    pub root: PathBuf,
}

impl DataDir {
    /// Open an existing data directory (it must contain `grows.json`).
    pub fn open(root: &Path) -> Result<DataDir, DataError> {
        if !root.join(GROWS_FILE).is_file() {
            return Err(DataError::NotADataDir(root.to_path_buf()));
        }
        Ok(DataDir {
            root: root.to_path_buf(),
        })
    }

    /// Create the directory with an empty snapshot if needed.
    pub fn init(root: &Path) -> Result<DataDir, DataError> {
        fs::create_dir_all(root.join(ENTRIES_DIR)).map_err(|e| DataError::WriteError {
            path: root.to_path_buf(),
            source: e,
        })?;
        let dir = DataDir {
            root: root.to_path_buf(),
        };
        if !dir.grows_path().exists() {
            save_grows(&dir, &[])?;
        }
        Ok(dir)
    }

    pub fn grows_path(&self) -> PathBuf {
        self.root.join(GROWS_FILE)
    }

    pub fn draft_path(&self) -> PathBuf {
        self.root.join(DRAFT_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn entries_dir(&self) -> PathBuf {
        self.root.join(ENTRIES_DIR)
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let text = fs::read_to_string(path).map_err(|e| DataError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| DataError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DataError> {
    let mut text = serde_json::to_string_pretty(value).map_err(|e| DataError::SerializeError {
        path: path.to_path_buf(),
        source: e,
    })?;
    text.push('\n');
    atomic_write(path, text.as_bytes()).map_err(|e| DataError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load the grow snapshot.
pub fn load_grows(dir: &DataDir) -> Result<Vec<Grow>, DataError> {
    read_json(&dir.grows_path())
}

pub fn save_grows(dir: &DataDir, grows: &[Grow]) -> Result<(), DataError> {
    write_json(&dir.grows_path(), grows)
}

/// Load the entry being edited, or a blank one.
pub fn load_draft(dir: &DataDir) -> Result<GrowLogEntry, DataError> {
    let path = dir.draft_path();
    if !path.exists() {
        return Ok(GrowLogEntry::default());
    }
    read_json(&path)
}

pub fn save_draft(dir: &DataDir, entry: &GrowLogEntry) -> Result<(), DataError> {
    write_json(&dir.draft_path(), entry)
}

pub fn clear_draft(dir: &DataDir) -> Result<(), DataError> {
    let path = dir.draft_path();
    if path.exists() {
        fs::remove_file(&path).map_err(|e| DataError::WriteError { path, source: e })?;
    }
    Ok(())
}
