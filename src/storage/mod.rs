// storage/mod.rs

pub mod metrics;
pub mod memory;
pub mod lmdb;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::config::subsystems::storage::StorageConfig;

pub use self::memory::MemoryStorage;
pub use self::lmdb::LMDBStorage;

/// A named partition of the inverted index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexLevel {
    /// Full aliases and names, case-sensitive, unsplit
    Aliases,
    /// First token of each entity name, lower-cased, with the full name embedded in the entry
    CiAliases,
    Title,
    Content,
    Metadata,
}

impl IndexLevel {
    pub const ALL: [IndexLevel; 5] = [
        IndexLevel::Aliases,
        IndexLevel::CiAliases,
        IndexLevel::Title,
        IndexLevel::Content,
        IndexLevel::Metadata,
    ];

    /// Levels scanned by document search
    pub const DOCUMENT_LEVELS: [IndexLevel; 3] = [
        IndexLevel::Title,
        IndexLevel::Content,
        IndexLevel::Metadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexLevel::Aliases => "aliases",
            IndexLevel::CiAliases => "cialiases",
            IndexLevel::Title => "title",
            IndexLevel::Content => "content",
            IndexLevel::Metadata => "metadata",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim_matches('"') {
            "aliases" => Some(IndexLevel::Aliases),
            "cialiases" => Some(IndexLevel::CiAliases),
            "title" => Some(IndexLevel::Title),
            "content" => Some(IndexLevel::Content),
            "metadata" => Some(IndexLevel::Metadata),
            _ => None,
        }
    }
}

impl std::fmt::Display for IndexLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tables holding the serialized entity and document records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordTable {
    Entities,
    Documents,
}

impl RecordTable {
    pub const ALL: [RecordTable; 2] = [RecordTable::Entities, RecordTable::Documents];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordTable::Entities => "entities",
            RecordTable::Documents => "documents",
        }
    }
}

/// Statistics about the storage backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub tokens_per_level: BTreeMap<IndexLevel, u64>,
    pub total_postings: u64,
    pub total_entities: u64,
    pub total_documents: u64,
}

impl StorageStats {
    pub fn total_tokens(&self) -> u64 {
        self.tokens_per_level.values().sum()
    }
}

/// The StorageBackend trait defines the interface that all storage implementations must provide.
///
/// Postings are opaque byte strings grouped into sets per `(level, token)`;
/// storing a posting that is already present is a no-op. Readers never see
/// a partially applied batch.
pub trait StorageBackend: Send + Sync {
    /// Add postings to the sets of their tokens
    fn store_postings_batch(&self, level: IndexLevel, postings: &[(String, Vec<u8>)]) -> Result<()>;

    /// Exact lookup of many tokens. Tokens without postings are absent from the result.
    fn get_postings_batch(&self, level: IndexLevel, tokens: &BTreeSet<String>) -> Result<BTreeMap<String, Vec<Vec<u8>>>>;

    /// Postings of every token starting with `prefix`, in token order
    fn get_postings_by_prefix(&self, level: IndexLevel, prefix: &str) -> Result<Vec<Vec<u8>>>;

    /// Insert or replace records by id
    fn store_records_batch(&self, table: RecordTable, records: &[(String, Vec<u8>)]) -> Result<()>;

    /// Fetch records by id, in request order, skipping unknown ids
    fn get_records_batch(&self, table: RecordTable, ids: &[String]) -> Result<Vec<(String, Vec<u8>)>>;

    /// Posting count of every token in `level`, rarest first
    fn token_frequencies(&self, level: IndexLevel) -> Result<Vec<(String, u64)>>;

    /// Get storage statistics
    fn get_stats(&self) -> Result<StorageStats>;

    /// Explicitly close the database
    fn close(&mut self) -> Result<()>;
}

/// Order token counts ascending, ties by token
pub(crate) fn sort_by_frequency(counts: &mut [(String, u64)]) {
    counts.sort_by(|(a_token, a_count), (b_token, b_count)| {
        a_count.cmp(b_count).then_with(|| a_token.cmp(b_token))
    });
}

/// Open (or create) the LMDB index at `path`
pub fn create_storage<P: AsRef<Path>>(path: P, config: StorageConfig) -> Result<LMDBStorage> {
    LMDBStorage::new(path, config)
}
