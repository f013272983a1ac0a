// storage/lmdb/batch.rs

use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use log::{debug, trace, warn};
use lmdb_rkv::{RwTransaction, Transaction, WriteFlags, Error as LmdbError};

use crate::error::{Error, Result};
use crate::storage::{IndexLevel, RecordTable};

use super::LMDBStorage;
use super::config::is_storable_key;

// Constants for transaction retry logic
const MAX_RETRY_ATTEMPTS: usize = 5;
const BASE_RETRY_DELAY_MS: u64 = 10;

impl LMDBStorage {
    /// Merge postings into the stored sets of their tokens.
    ///
    /// Tokens are grouped first so each key is read and rewritten once per
    /// transaction. Tokens LMDB cannot store are skipped with a warning.
    pub(crate) fn store_postings(&self, level: IndexLevel, postings: &[(String, Vec<u8>)]) -> Result<()> {
        if postings.is_empty() {
            return Ok(());
        }
        let db = self.level_db(level)?;

        let mut grouped: BTreeMap<&str, Vec<&[u8]>> = BTreeMap::new();
        for (token, posting) in postings {
            if !is_storable_key(token.as_bytes()) {
                warn!("Skipping token of {} bytes in level {}", token.len(), level);
                continue;
            }
            grouped.entry(token.as_str()).or_default().push(posting.as_slice());
        }

        let groups: Vec<(&str, Vec<&[u8]>)> = grouped.into_iter().collect();
        let start_time = Instant::now();

        for (i, chunk) in groups.chunks(self.batch_size).enumerate() {
            trace!("Storing posting batch {} for level {}: {} tokens", i + 1, level, chunk.len());

            let written = self.with_write_txn(|txn| {
                let mut bytes = 0u64;
                for (token, new_postings) in chunk {
                    let mut set = match txn.get(db, token) {
                        Ok(existing) => Self::deserialize_postings(existing)?,
                        Err(LmdbError::NotFound) => Default::default(),
                        Err(e) => return Err(Error::Database(format!("Failed to read token {:?}: {}", token, e))),
                    };
                    let before = set.len();
                    set.extend(new_postings.iter().map(|p| p.to_vec()));
                    if set.len() == before {
                        continue;
                    }

                    let serialized = Self::serialize_postings(&set)?;
                    txn.put(db, token, &serialized, WriteFlags::empty())
                        .map_err(|e| Error::Database(format!("Failed to store postings: {}", e)))?;
                    bytes += (token.len() + serialized.len()) as u64;
                }
                Ok(bytes)
            })?;

            self.metrics.increment_writes();
            self.metrics.record_bytes_written(written);
        }

        debug!(
            "Stored {} postings for {} tokens in level {} (took {:?})",
            postings.len(),
            groups.len(),
            level,
            start_time.elapsed()
        );
        Ok(())
    }

    /// Insert or replace records by id
    pub(crate) fn store_records(&self, table: RecordTable, records: &[(String, Vec<u8>)]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let db = self.record_db(table)?;

        for chunk in records.chunks(self.batch_size) {
            let written = self.with_write_txn(|txn| {
                let mut bytes = 0u64;
                for (id, record) in chunk {
                    if !is_storable_key(id.as_bytes()) {
                        warn!("Skipping {} record with unstorable id {:?}", table.as_str(), id);
                        continue;
                    }
                    txn.put(db, id, record, WriteFlags::empty())
                        .map_err(|e| Error::Database(format!("Failed to store record: {}", e)))?;
                    bytes += record.len() as u64;
                }
                Ok(bytes)
            })?;

            self.metrics.increment_writes();
            self.metrics.record_bytes_written(written);
        }

        debug!("Stored {} records in table {}", records.len(), table.as_str());
        Ok(())
    }

    /// Run `op` inside a write transaction, retrying transient LMDB failures
    /// with exponential backoff. Errors raised by `op` abort without retry.
    fn with_write_txn<T, F>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(&mut RwTransaction<'_>) -> Result<T>,
    {
        let mut attempt = 0;
        let start_time = Instant::now();

        while attempt < MAX_RETRY_ATTEMPTS {
            attempt += 1;

            let mut txn = match self.env.begin_rw_txn() {
                Ok(txn) => txn,
                Err(e) => {
                    if should_retry_transaction_error(&e) && attempt < MAX_RETRY_ATTEMPTS {
                        debug!("Transaction start failed (attempt {}), retrying: {}", attempt, e);
                        self.metrics.increment_retries();
                        apply_retry_backoff(attempt);
                        continue;
                    }
                    self.metrics.increment_failed_ops();
                    return Err(Error::Database(format!("Failed to start write transaction: {}", e)));
                }
            };

            let value = match op(&mut txn) {
                Ok(value) => value,
                Err(e) => {
                    txn.abort();
                    self.metrics.increment_failed_ops();
                    return Err(e);
                }
            };

            match txn.commit() {
                Ok(()) => {
                    if attempt > 1 {
                        debug!("Transaction succeeded after {} attempts in {:?}", attempt, start_time.elapsed());
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if should_retry_transaction_error(&e) && attempt < MAX_RETRY_ATTEMPTS {
                        debug!("Transaction commit failed (attempt {}), retrying: {}", attempt, e);
                        self.metrics.increment_retries();
                        apply_retry_backoff(attempt);
                        continue;
                    }
                    self.metrics.increment_failed_ops();
                    if let LmdbError::MapFull = e {
                        return Err(Error::storage(format!(
                            "LMDB map full at {:?}; increase lmdb_map_size_mb", self.db_path
                        )));
                    }
                    return Err(Error::Database(format!("Failed to commit transaction: {}", e)));
                }
            }
        }

        Err(Error::Database(format!("Failed to complete transaction after {} attempts", MAX_RETRY_ATTEMPTS)))
    }
}

/// Helper function to determine if a transaction error is retryable
pub(crate) fn should_retry_transaction_error(error: &LmdbError) -> bool {
    match error {
        LmdbError::MapResized => true,   // Map size changed, can retry
        LmdbError::ReadersFull => true,  // Readers may finish
        LmdbError::MapFull => false,     // Map is full, no point in retrying
        _ => false,
    }
}

/// Helper function to apply exponential backoff for retries
pub(crate) fn apply_retry_backoff(attempt: usize) {
    let exp_factor = 2u64.pow(attempt.saturating_sub(1) as u32);
    let jitter = fastrand::u64(0..10); // 0-10ms of jitter
    let delay_ms = BASE_RETRY_DELAY_MS * exp_factor + jitter;

    debug!("Transaction retry {} - sleeping for {}ms", attempt, delay_ms);
    std::thread::sleep(Duration::from_millis(delay_ms));
}
