// storage/lmdb/mod.rs

pub mod config;
pub mod init;
pub mod batch;
pub mod query;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::info;
use lmdb_rkv::{Environment, Database};

use crate::error::{Error, Result};
use crate::storage::metrics::StorageMetrics;
use super::{IndexLevel, RecordTable, StorageBackend, StorageStats};

/// Persistent index backed by one LMDB environment.
///
/// Each index level and record table is a named database. A posting
/// database maps a token to the bincode encoding of its sorted posting set.
#[derive(Clone)]
pub struct LMDBStorage {
    pub(crate) env: Arc<Environment>,
    pub(crate) level_dbs: HashMap<IndexLevel, Database>,
    pub(crate) record_dbs: HashMap<RecordTable, Database>,
    pub(crate) metrics: Arc<StorageMetrics>,
    pub(crate) batch_size: usize,
    pub(crate) db_path: PathBuf,
    pub(crate) map_size: usize,
}

impl std::fmt::Debug for LMDBStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LMDBStorage")
            .field("db_path", &self.db_path.display())
            .field("levels", &self.level_dbs.len())
            .field("batch_size", &self.batch_size)
            .field("map_size", &self.map_size)
            .finish()
    }
}

impl LMDBStorage {
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn metrics(&self) -> &StorageMetrics {
        &self.metrics
    }

    pub(crate) fn level_db(&self, level: IndexLevel) -> Result<Database> {
        self.level_dbs
            .get(&level)
            .copied()
            .ok_or_else(|| Error::Database(format!("No database for level {}", level)))
    }

    pub(crate) fn record_db(&self, table: RecordTable) -> Result<Database> {
        self.record_dbs
            .get(&table)
            .copied()
            .ok_or_else(|| Error::Database(format!("No database for table {}", table.as_str())))
    }

    /// Serialize a posting set to bytes
    pub(crate) fn serialize_postings(set: &BTreeSet<Vec<u8>>) -> Result<Vec<u8>> {
        bincode::serialize(set)
            .map_err(|e| Error::Serialization(format!("Bincode serialization failed: {}", e)))
    }

    /// Deserialize bytes to a posting set
    pub(crate) fn deserialize_postings(bytes: &[u8]) -> Result<BTreeSet<Vec<u8>>> {
        bincode::deserialize(bytes)
            .map_err(|e| Error::Serialization(format!("Bincode deserialization failed: {}", e)))
    }

    /// Flush the environment to disk. The handles stay usable.
    pub fn close(&mut self) -> Result<()> {
        info!("Closing LMDB database at {:?}", self.db_path);
        self.env
            .sync(true)
            .map_err(|e| Error::Database(format!("Failed to sync environment: {}", e)))?;

        let stats = self.metrics.get_stats();
        info!(
            "Storage metrics: {} writes, {} reads, {} retries, {} failures",
            stats.write_operations, stats.read_operations, stats.retried_operations, stats.failed_operations
        );
        Ok(())
    }
}

impl StorageBackend for LMDBStorage {
    fn store_postings_batch(&self, level: IndexLevel, postings: &[(String, Vec<u8>)]) -> Result<()> {
        self.store_postings(level, postings)
    }

    fn get_postings_batch(&self, level: IndexLevel, tokens: &BTreeSet<String>) -> Result<BTreeMap<String, Vec<Vec<u8>>>> {
        self.get_postings(level, tokens)
    }

    fn get_postings_by_prefix(&self, level: IndexLevel, prefix: &str) -> Result<Vec<Vec<u8>>> {
        self.scan_prefix(level, prefix)
    }

    fn store_records_batch(&self, table: RecordTable, records: &[(String, Vec<u8>)]) -> Result<()> {
        self.store_records(table, records)
    }

    fn get_records_batch(&self, table: RecordTable, ids: &[String]) -> Result<Vec<(String, Vec<u8>)>> {
        self.get_records(table, ids)
    }

    fn token_frequencies(&self, level: IndexLevel) -> Result<Vec<(String, u64)>> {
        self.count_postings_per_token(level)
    }

    fn get_stats(&self) -> Result<StorageStats> {
        self.calculate_storage_stats()
    }

    fn close(&mut self) -> Result<()> {
        LMDBStorage::close(self)
    }
}
