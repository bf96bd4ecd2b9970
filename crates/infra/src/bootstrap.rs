//! Process wiring: configuration → storage + bus → catalog.

use std::sync::Arc;

use anyhow::Context;

use tableside_events::InMemoryEventBus;
use tableside_seating::{ChangeEnvelope, InMemoryStorage, Storage, TableCatalog};

use crate::config::{CatalogConfig, StorageBackend};
use crate::storage::JsonFileStorage;

/// Catalog type used by applications: any storage backend, in-process bus.
pub type AppCatalog = TableCatalog<Box<dyn Storage>, Arc<InMemoryEventBus<ChangeEnvelope>>>;

/// Build the storage backend and open a catalog on it.
pub fn open_catalog(config: &CatalogConfig) -> anyhow::Result<AppCatalog> {
    let storage: Box<dyn Storage> = match &config.storage {
        StorageBackend::Memory => Box::new(InMemoryStorage::new()),
        StorageBackend::JsonFile(path) => Box::new(JsonFileStorage::new(path)),
    };
    let bus = Arc::new(InMemoryEventBus::new());

    TableCatalog::open(storage, bus)
        .with_context(|| format!("failed to open table catalog ({:?})", config.storage))
}

/// Read configuration from the environment, initialise tracing and open the catalog.
pub fn bootstrap() -> anyhow::Result<AppCatalog> {
    let config = CatalogConfig::from_env().context("invalid tableside configuration")?;
    tableside_observability::init_with_filter(&config.log_filter);
    tracing::info!(storage = ?config.storage, "starting table catalog");
    open_catalog(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tableside_seating::NewTable;

    #[test]
    fn memory_backend_opens_empty_catalog() {
        let catalog = open_catalog(&CatalogConfig::default()).unwrap();
        assert!(catalog.list_all().unwrap().is_empty());

        let table = catalog.create_table(NewTable::new("T1", 2)).unwrap();
        assert_eq!(catalog.get_by_id(table.id).unwrap().capacity, 2);
    }

    #[test]
    fn corrupt_file_backend_fails_with_context() {
        let dir = std::env::temp_dir().join(format!("tableside-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tables.json");
        std::fs::write(&path, "{").unwrap();

        let config = CatalogConfig {
            storage: StorageBackend::JsonFile(path),
            ..CatalogConfig::default()
        };
        let err = open_catalog(&config).err().unwrap();
        assert!(err.to_string().starts_with("failed to open table catalog"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
