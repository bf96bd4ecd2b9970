//! Persistence port for the table catalog.
//!
//! The catalog decides *when* to persist (after every committed mutation);
//! implementations decide *how*. Implementations must not retry silently in
//! a way that reorders saves: the last successful `save` wins.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::model::Table;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Durable home of the table rows (physical and virtual).
pub trait Storage: Send + Sync {
    /// Load every persisted row. An empty store loads as an empty list.
    fn load(&self) -> Result<Vec<Table>, StorageError>;

    /// Replace the persisted rows with `tables`.
    fn save(&self, tables: &[Table]) -> Result<(), StorageError>;
}

impl<S> Storage for Arc<S>
where
    S: Storage + ?Sized,
{
    fn load(&self) -> Result<Vec<Table>, StorageError> {
        (**self).load()
    }

    fn save(&self, tables: &[Table]) -> Result<(), StorageError> {
        (**self).save(tables)
    }
}

impl<S> Storage for Box<S>
where
    S: Storage + ?Sized,
{
    fn load(&self) -> Result<Vec<Table>, StorageError> {
        (**self).load()
    }

    fn save(&self, tables: &[Table]) -> Result<(), StorageError> {
        (**self).save(tables)
    }
}

/// In-memory storage.
///
/// Intended for tests/dev. Saves can be made to fail on demand to exercise
/// the catalog's recovery path.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: RwLock<Vec<Table>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Vec<Table>) -> Self {
        Self {
            tables: RwLock::new(tables),
            ..Self::default()
        }
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Rows as last saved.
    pub fn snapshot(&self) -> Vec<Table> {
        self.tables.read().map(|t| t.clone()).unwrap_or_default()
    }
}

impl Storage for InMemoryStorage {
    fn load(&self) -> Result<Vec<Table>, StorageError> {
        self.tables
            .read()
            .map(|t| t.clone())
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))
    }

    fn save(&self, tables: &[Table]) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("saves disabled".to_string()));
        }
        let mut stored = self
            .tables
            .write()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        *stored = tables.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
