// storage/lmdb/init.rs

use std::fs;
use std::path::Path;
use std::collections::HashMap;
use std::sync::Arc;
use log::{info, debug, error};
use lmdb_rkv::{Environment, Database, DatabaseFlags, Error as LmdbError};

use crate::error::{Error, Result};
use crate::config::subsystems::storage::StorageConfig;
use crate::storage::metrics::StorageMetrics;
use crate::storage::{IndexLevel, RecordTable};

use super::LMDBStorage;
use super::config::{create_env_options, db_flags};

impl LMDBStorage {
    /// Opens (creating if needed) the LMDB environment at `path` with one
    /// named database per index level and per record table.
    pub fn new<P: AsRef<Path>>(path: P, config: StorageConfig) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();

        if !path_buf.exists() {
            fs::create_dir_all(&path_buf)
                .map_err(|e| Error::storage(format!("Failed to create database directory: {}", e)))?;
        }

        let (env_flags, max_readers, max_dbs, map_size) = create_env_options(&config);

        let required_dbs = (IndexLevel::ALL.len() + RecordTable::ALL.len()) as u32;
        if max_dbs < required_dbs {
            return Err(Error::config(format!(
                "lmdb_max_dbs is {} but the index needs {} named databases",
                max_dbs, required_dbs
            )));
        }

        info!(
            "Creating LMDB environment at {:?} with map_size={} MB, max_readers={}, max_dbs={}",
            path_buf,
            map_size / (1024 * 1024),
            max_readers,
            max_dbs
        );

        let env = Self::create_environment(&path_buf, env_flags, max_readers, max_dbs, map_size)?;

        let mut level_dbs = HashMap::new();
        for level in IndexLevel::ALL {
            let db = Self::create_database(&env, level.as_str(), db_flags())?;
            level_dbs.insert(level, db);
        }

        let mut record_dbs = HashMap::new();
        for table in RecordTable::ALL {
            let db = Self::create_database(&env, table.as_str(), db_flags())?;
            record_dbs.insert(table, db);
        }

        let storage = Self {
            env: Arc::new(env),
            level_dbs,
            record_dbs,
            metrics: Arc::new(StorageMetrics::default()),
            batch_size: config.batch_size.max(1),
            db_path: path_buf.clone(),
            map_size,
        };

        info!("Initialized LMDB storage at {:?}", path_buf);
        Ok(storage)
    }

    /// Helper method to create an LMDB environment with error handling
    fn create_environment(
        path: &Path,
        flags: lmdb_rkv::EnvironmentFlags,
        max_readers: u32,
        max_dbs: u32,
        map_size: usize,
    ) -> Result<Environment> {
        debug!("Creating LMDB environment at {:?}", path);

        Environment::new()
            .set_flags(flags)
            .set_max_readers(max_readers)
            .set_max_dbs(max_dbs)
            .set_map_size(map_size)
            .open(path)
            .map_err(|e| match e {
                LmdbError::ReadersFull => {
                    error!("LMDB reader table is full. Another process may be holding stale readers.");
                    Error::storage(format!("LMDB readers full: {}", e))
                }
                LmdbError::VersionMismatch | LmdbError::Incompatible => {
                    error!("LMDB version mismatch. Database was created with an incompatible version.");
                    Error::storage(format!("LMDB version mismatch: {}", e))
                }
                _ => {
                    error!("Failed to open LMDB environment: {}", e);
                    Error::storage(format!("Failed to open LMDB environment: {}", e))
                }
            })
    }

    /// Helper method to create a database handle with error handling
    fn create_database(env: &Environment, name: &str, flags: DatabaseFlags) -> Result<Database> {
        debug!("Creating database: {}", name);

        env.create_db(Some(name), flags).map_err(|e| match e {
            LmdbError::DbsFull => {
                error!("Maximum number of databases reached. Increase lmdb_max_dbs in configuration.");
                Error::Database(format!("LMDB max databases reached: {}", e))
            }
            _ => {
                error!("Failed to open database {}: {}", name, e);
                Error::Database(format!("Failed to open database {}: {}", name, e))
            }
        })
    }
}
