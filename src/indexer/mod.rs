// indexer/mod.rs

pub mod entities;
pub mod documents;

pub use self::entities::EntityIndexer;
pub use self::documents::{DocumentIndexer, encode_location};

/// Counters returned by a batch indexing call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexingStats {
    pub records: usize,
    pub postings: usize,
    pub skipped: usize,
}

impl IndexingStats {
    pub fn merge(&mut self, other: IndexingStats) {
        self.records += other.records;
        self.postings += other.postings;
        self.skipped += other.skipped;
    }
}
