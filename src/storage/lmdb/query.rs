// storage/lmdb/query.rs

use std::collections::{BTreeMap, BTreeSet};
use log::{debug, trace, warn};
use lmdb_rkv::{Cursor, Database, RoTransaction, Transaction, Error as LmdbError};

use crate::error::{Error, Result};
use crate::storage::{sort_by_frequency, IndexLevel, RecordTable, StorageStats};

use super::LMDBStorage;
use super::config::is_storable_key;

impl LMDBStorage {
    /// Exact lookup of a set of tokens within one read transaction
    pub(crate) fn get_postings(&self, level: IndexLevel, tokens: &BTreeSet<String>) -> Result<BTreeMap<String, Vec<Vec<u8>>>> {
        let mut results = BTreeMap::new();
        if tokens.is_empty() {
            return Ok(results);
        }
        let db = self.level_db(level)?;

        let txn = self.begin_read()?;
        let mut bytes_read = 0u64;
        for token in tokens {
            if !is_storable_key(token.as_bytes()) {
                trace!("Token of {} bytes cannot be in level {}", token.len(), level);
                continue;
            }
            match txn.get(db, token) {
                Ok(value) => {
                    bytes_read += value.len() as u64;
                    let set = Self::deserialize_postings(value)?;
                    if !set.is_empty() {
                        results.insert(token.clone(), set.into_iter().collect());
                    }
                }
                Err(LmdbError::NotFound) => {}
                Err(e) => {
                    self.metrics.increment_failed_ops();
                    return Err(Error::Database(format!("Failed to read token {:?}: {}", token, e)));
                }
            }
        }
        txn.abort();

        self.metrics.increment_reads();
        self.metrics.record_bytes_read(bytes_read);
        debug!("Found {} of {} tokens in level {}", results.len(), tokens.len(), level);
        Ok(results)
    }

    /// Postings of every token starting with `prefix`, in key order
    pub(crate) fn scan_prefix(&self, level: IndexLevel, prefix: &str) -> Result<Vec<Vec<u8>>> {
        if prefix.len() > super::config::MAX_KEY_SIZE {
            return Ok(Vec::new());
        }
        let db = self.level_db(level)?;
        let txn = self.begin_read()?;

        let mut postings = Vec::new();
        {
            let mut cursor = txn.open_ro_cursor(db)
                .map_err(|e| Error::Database(format!("Failed to create cursor: {}", e)))?;

            let iter = if prefix.is_empty() {
                cursor.iter_start()
            } else {
                cursor.iter_from(prefix)
            };

            for result in iter {
                let (key, value) = result
                    .map_err(|e| Error::Database(format!("Error iterating cursor: {}", e)))?;
                if !key.starts_with(prefix.as_bytes()) {
                    break;
                }
                postings.extend(Self::deserialize_postings(value)?);
            }
        } // Cursor is dropped here

        txn.abort();
        self.metrics.increment_reads();
        trace!("Prefix {:?} in level {} matched {} postings", prefix, level, postings.len());
        Ok(postings)
    }

    /// Fetch records by id in request order, skipping ids that are not stored
    pub(crate) fn get_records(&self, table: RecordTable, ids: &[String]) -> Result<Vec<(String, Vec<u8>)>> {
        let db = self.record_db(table)?;
        let txn = self.begin_read()?;

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if !is_storable_key(id.as_bytes()) {
                continue;
            }
            match txn.get(db, id) {
                Ok(value) => {
                    self.metrics.record_bytes_read(value.len() as u64);
                    records.push((id.clone(), value.to_vec()));
                }
                Err(LmdbError::NotFound) => trace!("No {} record with id {:?}", table.as_str(), id),
                Err(e) => return Err(Error::Database(format!("Failed to read record {:?}: {}", id, e))),
            }
        }
        txn.abort();

        self.metrics.increment_reads();
        Ok(records)
    }

    /// Posting count per token in one level, rarest first
    pub(crate) fn count_postings_per_token(&self, level: IndexLevel) -> Result<Vec<(String, u64)>> {
        let db = self.level_db(level)?;
        let txn = self.begin_read()?;

        let mut counts = Vec::new();
        Self::for_each_entry(&txn, db, |key, value| {
            match Self::deserialize_postings(value) {
                Ok(set) => counts.push((String::from_utf8_lossy(key).into_owned(), set.len() as u64)),
                Err(e) => warn!("Unreadable posting set in level {}: {}", level, e),
            }
        })?;
        txn.abort();

        self.metrics.increment_reads();
        sort_by_frequency(&mut counts);
        Ok(counts)
    }

    /// Count tokens and postings per level and records per table
    pub(crate) fn calculate_storage_stats(&self) -> Result<StorageStats> {
        let txn = self.begin_read()?;
        let mut stats = StorageStats::default();

        for level in IndexLevel::ALL {
            let db = self.level_db(level)?;
            let mut tokens = 0u64;
            let mut postings = 0u64;
            Self::for_each_entry(&txn, db, |_, value| {
                tokens += 1;
                match Self::deserialize_postings(value) {
                    Ok(set) => postings += set.len() as u64,
                    Err(e) => warn!("Unreadable posting set in level {}: {}", level, e),
                }
            })?;
            stats.tokens_per_level.insert(level, tokens);
            stats.total_postings += postings;
        }

        let mut entities = 0u64;
        Self::for_each_entry(&txn, self.record_db(RecordTable::Entities)?, |_, _| entities += 1)?;
        let mut documents = 0u64;
        Self::for_each_entry(&txn, self.record_db(RecordTable::Documents)?, |_, _| documents += 1)?;
        stats.total_entities = entities;
        stats.total_documents = documents;

        txn.abort();
        Ok(stats)
    }

    fn for_each_entry<F>(txn: &RoTransaction<'_>, db: Database, mut visit: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]),
    {
        let mut cursor = txn.open_ro_cursor(db)
            .map_err(|e| Error::Database(format!("Failed to create cursor: {}", e)))?;
        for result in cursor.iter_start() {
            let (key, value) = result
                .map_err(|e| Error::Database(format!("Error iterating cursor: {}", e)))?;
            visit(key, value);
        }
        Ok(())
    }

    fn begin_read(&self) -> Result<RoTransaction<'_>> {
        self.env.begin_ro_txn().map_err(|e| {
            self.metrics.increment_failed_ops();
            Error::Database(format!("Failed to start read transaction: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::subsystems::storage::StorageConfig;
    use crate::storage::StorageBackend;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> LMDBStorage {
        let config = StorageConfig {
            lmdb_map_size_mb: Some(64),
            batch_size: 2,
            ..StorageConfig::default()
        };
        LMDBStorage::new(dir.path(), config).unwrap()
    }

    fn postings(items: &[(&str, &str)]) -> Vec<(String, Vec<u8>)> {
        items.iter().map(|(t, p)| (t.to_string(), p.as_bytes().to_vec())).collect()
    }

    #[test]
    fn merges_posting_sets_across_batches() {
        let dir = TempDir::new().unwrap();
        let storage = open(&dir);

        storage.store_postings_batch(
            IndexLevel::Aliases,
            &postings(&[("TP53", "x"), ("TP53", "y"), ("BRCA1", "z"), ("ATM", "w")]),
        ).unwrap();
        storage.store_postings_batch(IndexLevel::Aliases, &postings(&[("TP53", "x"), ("TP53", "a")])).unwrap();

        let tokens: BTreeSet<String> = ["TP53", "ATM", "KRAS"].iter().map(|s| s.to_string()).collect();
        let hits = storage.get_postings_batch(IndexLevel::Aliases, &tokens).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits["TP53"], vec![b"a".to_vec(), b"x".to_vec(), b"y".to_vec()]);
        assert_eq!(hits["ATM"], vec![b"w".to_vec()]);
    }

    #[test]
    fn prefix_scan_and_oversized_tokens() {
        let dir = TempDir::new().unwrap();
        let storage = open(&dir);
        let long = "a".repeat(600);

        storage.store_postings_batch(
            IndexLevel::Content,
            &postings(&[("fever", "d1"), ("fevers", "d2"), ("few", "d3"), (long.as_str(), "d4")]),
        ).unwrap();

        assert_eq!(
            storage.get_postings_by_prefix(IndexLevel::Content, "fev").unwrap(),
            vec![b"d1".to_vec(), b"d2".to_vec()]
        );
        assert_eq!(storage.get_postings_by_prefix(IndexLevel::Content, "").unwrap().len(), 3);
        assert!(storage.get_postings_by_prefix(IndexLevel::Content, "zzz").unwrap().is_empty());

        let tokens: BTreeSet<String> = [long].into_iter().collect();
        assert!(storage.get_postings_batch(IndexLevel::Content, &tokens).unwrap().is_empty());
    }

    #[test]
    fn records_and_stats_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut storage = open(&dir);
            storage.store_records_batch(
                RecordTable::Documents,
                &[("d1".to_string(), b"{\"id\":\"d1\"}".to_vec()), ("d2".to_string(), b"{}".to_vec())],
            ).unwrap();
            storage.store_postings_batch(IndexLevel::Title, &postings(&[("fever", "d1")])).unwrap();
            storage.close().unwrap();
        }

        let storage = open(&dir);
        let records = storage
            .get_records_batch(RecordTable::Documents, &["d2".to_string(), "missing".to_string(), "d1".to_string()])
            .unwrap();
        let ids: Vec<&str> = records.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["d2", "d1"]);

        let stats = storage.get_stats().unwrap();
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.total_entities, 0);
        assert_eq!(stats.tokens_per_level[&IndexLevel::Title], 1);
        assert_eq!(stats.total_postings, 1);
    }

    #[test]
    fn token_frequencies_walk_the_whole_level() {
        let dir = TempDir::new().unwrap();
        let storage = open(&dir);
        storage.store_postings_batch(
            IndexLevel::Content,
            &postings(&[("the", "d1"), ("the", "d2"), ("fever", "d1")]),
        ).unwrap();
        storage.store_postings_batch(IndexLevel::Content, &postings(&[("the", "d3"), ("cough", "d3")])).unwrap();

        let counts = storage.token_frequencies(IndexLevel::Content).unwrap();
        assert_eq!(counts, vec![
            ("cough".to_string(), 1),
            ("fever".to_string(), 1),
            ("the".to_string(), 3),
        ]);
        assert!(storage.token_frequencies(IndexLevel::Metadata).unwrap().is_empty());
    }
}
