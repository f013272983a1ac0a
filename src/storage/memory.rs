// storage/memory.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};
use log::debug;
use parking_lot::RwLock;

use crate::error::Result;
use crate::storage::metrics::StorageMetrics;
use super::{sort_by_frequency, IndexLevel, RecordTable, StorageBackend, StorageStats};

type PostingMap = BTreeMap<String, BTreeSet<Vec<u8>>>;

/// In-process index with the same semantics as the LMDB store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    levels: RwLock<HashMap<IndexLevel, PostingMap>>,
    records: RwLock<HashMap<RecordTable, BTreeMap<String, Vec<u8>>>>,
    metrics: StorageMetrics,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &StorageMetrics {
        &self.metrics
    }
}

impl StorageBackend for MemoryStorage {
    fn store_postings_batch(&self, level: IndexLevel, postings: &[(String, Vec<u8>)]) -> Result<()> {
        let mut levels = self.levels.write();
        let map = levels.entry(level).or_default();
        for (token, posting) in postings {
            map.entry(token.clone()).or_default().insert(posting.clone());
            self.metrics.record_bytes_written((token.len() + posting.len()) as u64);
        }
        self.metrics.increment_writes();
        debug!("Stored {} postings in level {}", postings.len(), level);
        Ok(())
    }

    fn get_postings_batch(&self, level: IndexLevel, tokens: &BTreeSet<String>) -> Result<BTreeMap<String, Vec<Vec<u8>>>> {
        self.metrics.increment_reads();
        let levels = self.levels.read();
        let Some(map) = levels.get(&level) else {
            return Ok(BTreeMap::new());
        };

        Ok(tokens
            .iter()
            .filter_map(|token| {
                map.get(token)
                    .filter(|set| !set.is_empty())
                    .map(|set| (token.clone(), set.iter().cloned().collect()))
            })
            .collect())
    }

    fn get_postings_by_prefix(&self, level: IndexLevel, prefix: &str) -> Result<Vec<Vec<u8>>> {
        self.metrics.increment_reads();
        let levels = self.levels.read();
        let Some(map) = levels.get(&level) else {
            return Ok(Vec::new());
        };

        Ok(map
            .range(prefix.to_string()..)
            .take_while(|(token, _)| token.starts_with(prefix))
            .flat_map(|(_, set)| set.iter().cloned())
            .collect())
    }

    fn store_records_batch(&self, table: RecordTable, records: &[(String, Vec<u8>)]) -> Result<()> {
        let mut tables = self.records.write();
        let map = tables.entry(table).or_default();
        for (id, bytes) in records {
            map.insert(id.clone(), bytes.clone());
            self.metrics.record_bytes_written(bytes.len() as u64);
        }
        self.metrics.increment_writes();
        Ok(())
    }

    fn get_records_batch(&self, table: RecordTable, ids: &[String]) -> Result<Vec<(String, Vec<u8>)>> {
        self.metrics.increment_reads();
        let tables = self.records.read();
        let Some(map) = tables.get(&table) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| map.get(id).map(|bytes| (id.clone(), bytes.clone())))
            .collect())
    }

    fn token_frequencies(&self, level: IndexLevel) -> Result<Vec<(String, u64)>> {
        self.metrics.increment_reads();
        let levels = self.levels.read();
        let mut counts: Vec<(String, u64)> = levels
            .get(&level)
            .map(|map| map.iter().map(|(token, set)| (token.clone(), set.len() as u64)).collect())
            .unwrap_or_default();
        sort_by_frequency(&mut counts);
        Ok(counts)
    }

    fn get_stats(&self) -> Result<StorageStats> {
        let levels = self.levels.read();
        let records = self.records.read();

        let mut stats = StorageStats::default();
        for (level, map) in levels.iter() {
            stats.tokens_per_level.insert(*level, map.len() as u64);
            stats.total_postings += map.values().map(|set| set.len() as u64).sum::<u64>();
        }
        stats.total_entities = records.get(&RecordTable::Entities).map_or(0, |m| m.len() as u64);
        stats.total_documents = records.get(&RecordTable::Documents).map_or(0, |m| m.len() as u64);
        Ok(stats)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postings(items: &[(&str, &str)]) -> Vec<(String, Vec<u8>)> {
        items.iter().map(|(t, p)| (t.to_string(), p.as_bytes().to_vec())).collect()
    }

    #[test]
    fn postings_merge_as_sets() {
        let storage = MemoryStorage::new();
        storage.store_postings_batch(IndexLevel::Aliases, &postings(&[("p53", "a"), ("p53", "b")])).unwrap();
        storage.store_postings_batch(IndexLevel::Aliases, &postings(&[("p53", "a")])).unwrap();

        let tokens: BTreeSet<String> = ["p53".to_string(), "missing".to_string()].into_iter().collect();
        let hits = storage.get_postings_batch(IndexLevel::Aliases, &tokens).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits["p53"], vec![b"a".to_vec(), b"b".to_vec()]);

        // Levels are isolated from each other
        let other = storage.get_postings_batch(IndexLevel::CiAliases, &tokens).unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn prefix_scan_stops_at_prefix_end() {
        let storage = MemoryStorage::new();
        storage.store_postings_batch(
            IndexLevel::Content,
            &postings(&[("fever", "d1"), ("fevers", "d2"), ("few", "d3"), ("fe", "d4")]),
        ).unwrap();

        let hits = storage.get_postings_by_prefix(IndexLevel::Content, "fev").unwrap();
        assert_eq!(hits, vec![b"d1".to_vec(), b"d2".to_vec()]);
    }

    #[test]
    fn token_frequencies_are_rarest_first() {
        let storage = MemoryStorage::new();
        storage.store_postings_batch(
            IndexLevel::Content,
            &postings(&[("the", "d1"), ("the", "d2"), ("the", "d3"), ("fever", "d1"), ("cough", "d2"), ("cough", "d3")]),
        ).unwrap();
        storage.store_postings_batch(IndexLevel::Aliases, &postings(&[("TP53", "u1")])).unwrap();

        let counts = storage.token_frequencies(IndexLevel::Content).unwrap();
        assert_eq!(counts, vec![
            ("fever".to_string(), 1),
            ("cough".to_string(), 2),
            ("the".to_string(), 3),
        ]);
        assert!(storage.token_frequencies(IndexLevel::Title).unwrap().is_empty());
    }

    #[test]
    fn stats_count_tokens_and_records() {
        let storage = MemoryStorage::new();
        storage.store_postings_batch(IndexLevel::Aliases, &postings(&[("a", "1"), ("b", "1"), ("b", "2")])).unwrap();
        storage.store_records_batch(RecordTable::Entities, &[("e1".to_string(), b"{}".to_vec())]).unwrap();

        let stats = storage.get_stats().unwrap();
        assert_eq!(stats.total_tokens(), 2);
        assert_eq!(stats.total_postings, 3);
        assert_eq!(stats.total_entities, 1);
        assert_eq!(stats.total_documents, 0);
    }
}
