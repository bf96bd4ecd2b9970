//! Infrastructure layer: storage adapters, configuration and process wiring.

pub mod bootstrap;
pub mod config;
pub mod storage;

mod integration_tests;

pub use bootstrap::{AppCatalog, bootstrap, open_catalog};
pub use config::{CatalogConfig, ConfigError, StorageBackend};
pub use storage::JsonFileStorage;
