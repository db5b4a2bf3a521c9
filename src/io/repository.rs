use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::io::data_io::{self, DataDir, DataError};
use crate::io::lock::{LockError, SaveLock};
use crate::model::grow::{Grow, find_grow_mut};
use crate::ops::relevance::relevant_plant_keys;
use crate::ops::save::SavePayload;

pub type EntryId = String;

static ENTRY_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^E-(\d+)\.json$").expect("valid regex"));

/// Error type for entry persistence
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("entry not found: {0}")]
    NotFound(EntryId),
    #[error("grow not found: {0}")]
    UnknownGrow(String),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Persistence collaborator for saved entries.
///
/// A payload with `apply_stage_to_plants` set is also cascaded to the
/// plants it names (all plants when the list is empty).
pub trait EntryRepository {
    fn create_entry(&mut self, payload: &SavePayload) -> Result<EntryId, RepositoryError>;
    fn update_entry(&mut self, id: &str, payload: &SavePayload) -> Result<(), RepositoryError>;
}

/// A saved entry on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntry {
    pub id: EntryId,
    pub saved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: SavePayload,
}

/// Write the payload's stage onto its plants. Returns how many records
/// changed. A payload without apply-to-plants touches nothing.
///
/// When the whole grow is targeted and it has no plants, the grow's own
/// fallback stage is updated instead.
pub fn cascade_stage(grows: &mut [Grow], payload: &SavePayload) -> Result<usize, RepositoryError> {
    if !payload.apply_stage_to_plants {
        return Ok(0);
    }
    let (Some(grow_id), Some(stage)) = (payload.grow.as_deref(), payload.stage.as_deref()) else {
        return Ok(0);
    };
    let grow = find_grow_mut(grows, grow_id)
        .ok_or_else(|| RepositoryError::UnknownGrow(grow_id.to_string()))?;

    if grow.plants.is_empty() && payload.plants.is_empty() {
        grow.stage = Some(stage.to_string());
        return Ok(1);
    }

    let mut changed = 0;
    for key in relevant_plant_keys(grow, &payload.plants) {
        if let Some(plant) = grow.plant_mut(&key)
            && plant.stage.as_deref() != Some(stage)
        {
            plant.stage = Some(stage.to_string());
            changed += 1;
        }
    }
    Ok(changed)
}

/// Repository backed by a data directory: `entries/E-NNN.json` plus the
/// grow snapshot in `grows.json`.
pub struct FileRepository {
    dir: DataDir,
}

impl FileRepository {
    pub fn new(dir: DataDir) -> Self {
        FileRepository { dir }
    }

    fn entry_path(&self, id: &str) -> std::path::PathBuf {
        self.dir.entries_dir().join(format!("{}.json", id))
    }

    fn next_id(&self) -> Result<EntryId, RepositoryError> {
        let entries_dir = self.dir.entries_dir();
        let mut max = 0usize;
        if entries_dir.is_dir() {
            let read = fs::read_dir(&entries_dir).map_err(|e| DataError::ReadError {
                path: entries_dir.clone(),
                source: e,
            })?;
            for dirent in read.flatten() {
                let name = dirent.file_name().to_string_lossy().into_owned();
                let Some(caps) = ENTRY_FILE_RE.captures(&name) else {
                    continue;
                };
                if let Ok(n) = caps[1].parse::<usize>() {
                    max = max.max(n);
                }
            }
        }
        Ok(format!("E-{:03}", max + 1))
    }

    /// Store an entry and apply its cascade. Must run under the save lock.
    fn write(&self, id: &str, payload: &SavePayload) -> Result<(), RepositoryError> {
        // Cascade in memory first so an unknown grow fails before any write
        let cascaded = if payload.apply_stage_to_plants {
            let mut grows = data_io::load_grows(&self.dir)?;
            let changed = cascade_stage(&mut grows, payload)?;
            Some((grows, changed))
        } else {
            None
        };

        fs::create_dir_all(self.dir.entries_dir()).map_err(|e| DataError::WriteError {
            path: self.dir.entries_dir(),
            source: e,
        })?;
        let stored = StoredEntry {
            id: id.to_string(),
            saved_at: Utc::now(),
            payload: payload.clone(),
        };

        commit_entry(&self.entry_path(id), &stored, || match &cascaded {
            Some((grows, changed)) => {
                data_io::save_grows(&self.dir, grows)?;
                tracing::info!(entry = id, changed = *changed, "cascaded stage to plants");
                Ok(())
            }
            None => Ok(()),
        })?;
        tracing::info!(entry = id, "entry saved");
        Ok(())
    }

    pub fn load_entry(&self, id: &str) -> Result<StoredEntry, RepositoryError> {
        let path = self.entry_path(id);
        if !path.exists() {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(data_io::read_json(&path)?)
    }
}

/// Write the entry file, then run `cascade`. If the cascade fails the entry
/// file is put back the way it was (removed, or its previous bytes restored),
/// so a recorded entry always matches the snapshot.
fn commit_entry<F>(path: &Path, stored: &StoredEntry, cascade: F) -> Result<(), RepositoryError>
where
    F: FnOnce() -> Result<(), DataError>,
{
    let previous = fs::read(path).ok();
    data_io::write_json(path, stored)?;

    if let Err(err) = cascade() {
        let restored = match &previous {
            Some(bytes) => data_io::atomic_write(path, bytes),
            None => fs::remove_file(path),
        };
        if let Err(restore_err) = restored {
            tracing::error!(
                path = %path.display(),
                error = %restore_err,
                "could not roll back entry after failed cascade"
            );
        }
        return Err(err.into());
    }
    Ok(())
}

impl EntryRepository for FileRepository {
    fn create_entry(&mut self, payload: &SavePayload) -> Result<EntryId, RepositoryError> {
        let _lock = SaveLock::hold_default(&self.dir)?;
        let id = self.next_id()?;
        self.write(&id, payload)?;
        Ok(id)
    }

    fn update_entry(&mut self, id: &str, payload: &SavePayload) -> Result<(), RepositoryError> {
        let _lock = SaveLock::hold_default(&self.dir)?;
        if !self.entry_path(id).exists() {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        self.write(id, payload)
    }
}

/// In-memory repository, mostly for tests and embedding hosts
#[derive(Debug, Default)]
pub struct MemoryRepository {
    pub grows: Vec<Grow>,
    pub entries: IndexMap<EntryId, SavePayload>,
}

impl MemoryRepository {
    pub fn new(grows: Vec<Grow>) -> Self {
        MemoryRepository {
            grows,
            entries: IndexMap::new(),
        }
    }
}

impl EntryRepository for MemoryRepository {
    fn create_entry(&mut self, payload: &SavePayload) -> Result<EntryId, RepositoryError> {
        cascade_stage(&mut self.grows, payload)?;
        let id = format!("E-{:03}", self.entries.len() + 1);
        self.entries.insert(id.clone(), payload.clone());
        Ok(id)
    }

    fn update_entry(&mut self, id: &str, payload: &SavePayload) -> Result<(), RepositoryError> {
        if !self.entries.contains_key(id) {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        cascade_stage(&mut self.grows, payload)?;
        self.entries.insert(id.to_string(), payload.clone());
        Ok(())
    }
}
