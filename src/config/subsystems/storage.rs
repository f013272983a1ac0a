// src/config/subsystems/storage.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_flag};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    // Base path
    pub db_path: PathBuf,

    // I/O settings
    pub use_fsync: bool,

    // General processing settings
    pub batch_size: usize,

    // LMDB-specific settings
    pub lmdb_max_readers: Option<u32>,     // Maximum number of reader slots
    pub lmdb_max_dbs: Option<u32>,         // Maximum number of named databases
    pub lmdb_map_size_mb: Option<usize>,   // Memory map size in megabytes
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("db/translatron"),
            use_fsync: false,
            batch_size: 10_000,
            lmdb_max_readers: Some(126),
            lmdb_max_dbs: Some(16),
            lmdb_map_size_mb: Some(10240),    // Default 10GB map size
        }
    }
}

impl FromIni for StorageConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "storage" {
            return None;
        }

        match key {
            "db_path" => {
                self.db_path = PathBuf::from(value.trim_matches('"'));
                Some(Ok(()))
            },
            "use_fsync" => parse_flag(&mut self.use_fsync, key, value),
            "batch_size" => {
                match value.parse() {
                    Ok(size) if size > 0 => {
                        self.batch_size = size;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid batch_size (must be > 0): {}", value)
                    ))),
                }
            },
            "lmdb_max_readers" => {
                match value.parse() {
                    Ok(readers) if readers > 0 => {
                        self.lmdb_max_readers = Some(readers);
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid lmdb_max_readers (must be > 0): {}", value)
                    ))),
                }
            },
            "lmdb_max_dbs" => {
                match value.parse() {
                    Ok(dbs) if dbs > 0 => {
                        self.lmdb_max_dbs = Some(dbs);
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid lmdb_max_dbs (must be > 0): {}", value)
                    ))),
                }
            },
            "lmdb_map_size_mb" => {
                match value.parse() {
                    Ok(size) if size > 0 => {
                        self.lmdb_map_size_mb = Some(size);
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid lmdb_map_size_mb (must be > 0): {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(max_dbs) = self.lmdb_max_dbs {
            // One named database per index level plus the two record tables
            let required = crate::storage::IndexLevel::ALL.len() + crate::storage::RecordTable::ALL.len();
            if (max_dbs as usize) < required {
                return Err(Error::Config(
                    format!("lmdb_max_dbs must be at least {}, got {}", required, max_dbs)
                ));
            }
        }
        Ok(())
    }
}
