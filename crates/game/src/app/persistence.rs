use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use overworld_engine::sim::{Direction, GridPos, IdSet, MemoryIdSet};
use overworld_engine::write_text_atomic;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub(crate) const SEEN_KEY: &str = "seen";
pub(crate) const CAUGHT_KEY: &str = "caught";
pub(crate) const SAVE_FILE: &str = "overworld.save.json";

#[derive(Debug, Error)]
pub(crate) enum PersistenceError {
    #[error("read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse '{path}' at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `IdSet` backed by one JSON array file. Every new id rewrites the file.
#[derive(Debug)]
pub(crate) struct JsonIdStore {
    path: PathBuf,
    ids: MemoryIdSet,
}

impl JsonIdStore {
    /// Opens `<dir>/<key>.json`. Missing, unreadable or malformed files start empty.
    pub(crate) fn open(dir: &Path, key: &str) -> Self {
        let path = dir.join(format!("{key}.json"));
        let ids = match read_json::<Vec<String>>(&path) {
            Ok(Some(ids)) => {
                debug!(key, count = ids.len(), "persistence_loaded");
                ids.into_iter().collect()
            }
            Ok(None) => MemoryIdSet::new(),
            Err(error) => {
                warn!(key, error = %error, "persistence_read_failed");
                MemoryIdSet::new()
            }
        };
        Self { path, ids }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        let ids: Vec<&str> = self.ids.iter().collect();
        write_json(&self.path, &ids)
    }
}

impl IdSet for JsonIdStore {
    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn add(&mut self, id: &str) -> bool {
        if !self.ids.add(id) {
            return false;
        }
        if let Err(error) = self.persist() {
            warn!(id, error = %error, "persistence_write_failed");
        }
        true
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SaveGame {
    pub(crate) position: GridPos,
    pub(crate) direction: Direction,
}

pub(crate) fn write_save(path: &Path, save: &SaveGame) -> Result<(), PersistenceError> {
    write_json(path, save)?;
    info!(path = %path.display(), x = save.position.x, y = save.position.y, "progress_saved");
    Ok(())
}

pub(crate) fn read_save(path: &Path) -> Result<Option<SaveGame>, PersistenceError> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    serde_path_to_error::deserialize(&mut deserializer)
        .map(Some)
        .map_err(|error| {
            let json_path = error.path().to_string();
            PersistenceError::Parse {
                path: path.to_path_buf(),
                json_path,
                source: error.into_inner(),
            }
        })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    write_text_atomic(path, &json).map_err(|source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    })
}
