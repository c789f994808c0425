//! The record store: a single pretty-printed JSON array on disk, read and rewritten whole.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::{Value, ser::PrettyFormatter};
use tokio::{sync::Mutex, task};
use tracing::warn;

use crate::model::student_record::StudentRecord;

mod migration;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not serialize records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("file task did not finish: {0}")]
    Task(#[from] task::JoinError),
}

pub struct RecordStore {
    path: PathBuf,
    // Held across load, mutate and save so requests in this process can't interleave writes.
    lock: Mutex<()>,
}

fn load_file(path: &Path) -> Result<Vec<StudentRecord>, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            warn!(
                "{} is not valid UTF-8 ({e}). Continuing with an empty list.",
                path.display()
            );
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if contents.is_empty() {
        return Ok(Vec::new());
    }

    // Only the outer array has to be well formed. Each element is migrated field by field.
    match serde_json::from_str::<Vec<Value>>(&contents) {
        Ok(stored) => Ok(stored
            .into_iter()
            .map(|value| migration::StoredRecord::from_value(value).migrate())
            .collect()),
        Err(e) => {
            warn!(
                "{} is corrupt or not a JSON array ({e}). Continuing with an empty list.",
                path.display()
            );
            Ok(Vec::new())
        }
    }
}

fn save_file(path: &Path, records: &[StudentRecord]) -> Result<(), StoreError> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut serializer)?;

    let io_err = |source: io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, &buf).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record, backfilling fields older files lack.
    ///
    /// A missing or empty file is an empty collection. So is a file that isn't a JSON array:
    /// that case is logged and otherwise ignored. A field of the wrong type inside a record only
    /// falls back to its default.
    pub fn load_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        load_file(&self.path)
    }

    /// Replaces the whole file. The new document is written beside the old one and renamed over
    /// it, so a failed write never leaves half a file behind.
    pub fn save_all(&self, records: &[StudentRecord]) -> Result<(), StoreError> {
        save_file(&self.path, records)
    }

    async fn load_blocking(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let path = self.path.clone();
        task::spawn_blocking(move || load_file(&path)).await?
    }

    async fn save_blocking(&self, records: Vec<StudentRecord>) -> Result<(), StoreError> {
        let path = self.path.clone();
        task::spawn_blocking(move || save_file(&path, &records)).await?
    }

    /// Runs `f` over a fresh load of the collection.
    pub async fn read<T>(&self, f: impl FnOnce(&[StudentRecord]) -> T) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        let records = self.load_blocking().await?;
        Ok(f(&records))
    }

    /// Loads, applies `f`, and saves the result as one critical section. Nothing is written when
    /// `f` fails.
    pub async fn update<T, E>(
        &self,
        f: impl FnOnce(&mut Vec<StudentRecord>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let _guard = self.lock.lock().await;
        let mut records = self.load_blocking().await?;
        let out = f(&mut records)?;
        self.save_blocking(records).await?;
        Ok(out)
    }
}
