//! JSON file storage.
//!
//! The whole catalog is written as one document on every save:
//!
//! ```json
//! { "format_version": 1, "tables": [ ... ] }
//! ```
//!
//! Writes go to a sibling temp file that is synced to disk and then renamed
//! over the target, so a crash mid-write leaves the previous snapshot intact.
//! The directory is synced after the rename.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use tableside_seating::{Storage, StorageError, Table};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoredCatalog {
    format_version: u32,
    tables: Vec<Table>,
}

#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "tables.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<Vec<Table>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no catalog file yet; starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let stored: StoredCatalog = serde_json::from_slice(&bytes)?;
        if stored.format_version != FORMAT_VERSION {
            return Err(StorageError::Unavailable(format!(
                "unsupported catalog format version {} in {}",
                stored.format_version,
                self.path.display()
            )));
        }
        tracing::debug!(path = %self.path.display(), tables = stored.tables.len(), "catalog loaded");
        Ok(stored.tables)
    }

    fn save(&self, tables: &[Table]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let document = StoredCatalog {
            format_version: FORMAT_VERSION,
            tables: tables.to_vec(),
        };
        let bytes = serde_json::to_vec_pretty(&document)?;

        let temp = self.temp_path();
        if let Err(e) = write_synced(&temp, &bytes).and_then(|()| fs::rename(&temp, &self.path)) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Ok(dir) = File::open(dir) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
