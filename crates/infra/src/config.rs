//! Configuration loading and representation.
//!
//! | variable | values | default |
//! |---|---|---|
//! | `TABLESIDE_STORAGE` | `memory`, `file` | `memory` |
//! | `TABLESIDE_DATA_PATH` | path of the JSON catalog file | `data/tables.json` |
//! | `TABLESIDE_LOG` | tracing filter directive | `info` |

use std::path::PathBuf;

use thiserror::Error;

pub const STORAGE_VAR: &str = "TABLESIDE_STORAGE";
pub const DATA_PATH_VAR: &str = "TABLESIDE_DATA_PATH";
pub const LOG_VAR: &str = "TABLESIDE_LOG";

pub const DEFAULT_DATA_PATH: &str = "data/tables.json";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Nothing survives the process. Tests and demos.
    Memory,
    JsonFile(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub storage: StorageBackend,
    pub log_filter: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TABLESIDE_STORAGE must be 'memory' or 'file', got '{0}'")]
    UnknownBackend(String),

    #[error("TABLESIDE_DATA_PATH cannot be empty")]
    EmptyPath,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl CatalogConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup` (an environment stand-in).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match lookup(STORAGE_VAR)
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("memory") => StorageBackend::Memory,
            Some("file") => {
                let path = lookup(DATA_PATH_VAR).unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());
                if path.trim().is_empty() {
                    return Err(ConfigError::EmptyPath);
                }
                StorageBackend::JsonFile(PathBuf::from(path.trim()))
            }
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let log_filter = lookup(LOG_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            storage,
            log_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_memory_and_info() {
        let config = CatalogConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CatalogConfig::default());
    }

    #[test]
    fn file_backend_uses_given_or_default_path() {
        let config = CatalogConfig::from_lookup(lookup(&[
            (STORAGE_VAR, "File"),
            (DATA_PATH_VAR, "/var/lib/tableside/floor.json"),
            (LOG_VAR, "tableside_seating=debug"),
        ]))
        .unwrap();
        assert_eq!(
            config.storage,
            StorageBackend::JsonFile(PathBuf::from("/var/lib/tableside/floor.json"))
        );
        assert_eq!(config.log_filter, "tableside_seating=debug");

        let config = CatalogConfig::from_lookup(lookup(&[(STORAGE_VAR, "file")])).unwrap();
        assert_eq!(config.storage, StorageBackend::JsonFile(PathBuf::from(DEFAULT_DATA_PATH)));
    }

    #[test]
    fn rejects_unknown_backend_and_blank_path() {
        assert_eq!(
            CatalogConfig::from_lookup(lookup(&[(STORAGE_VAR, "redis")])),
            Err(ConfigError::UnknownBackend("redis".to_string()))
        );
        assert_eq!(
            CatalogConfig::from_lookup(lookup(&[(STORAGE_VAR, "file"), (DATA_PATH_VAR, "  ")])),
            Err(ConfigError::EmptyPath)
        );
    }
}
