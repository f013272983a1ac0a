// index/lookup.rs

use std::collections::{BTreeMap, BTreeSet};
use log::debug;

use crate::error::Result;
use crate::storage::{IndexLevel, StorageBackend};
use super::entry::IndexEntry;

/// Batched exact-token lookups against the entity index.
///
/// Both calls are read-only and idempotent. Tokens without a valid entry
/// are absent from the result, and an empty token set gives an empty map
/// without touching the index.
pub trait EntityLookup: Send + Sync {
    /// Exact, case-sensitive lookup of whole aliases
    fn lookup_exact_case_sensitive(
        &self,
        tokens: &BTreeSet<String>,
        level: IndexLevel,
    ) -> Result<BTreeMap<String, Vec<IndexEntry>>>;

    /// Lookup of lower-cased first tokens; every entry carries the full name
    fn lookup_exact_first_token(
        &self,
        tokens: &BTreeSet<String>,
        level: IndexLevel,
    ) -> Result<BTreeMap<String, Vec<IndexEntry>>>;
}

impl<S: StorageBackend + ?Sized> EntityLookup for S {
    fn lookup_exact_case_sensitive(
        &self,
        tokens: &BTreeSet<String>,
        level: IndexLevel,
    ) -> Result<BTreeMap<String, Vec<IndexEntry>>> {
        lookup_with(self, tokens, level, IndexEntry::decode_alias)
    }

    fn lookup_exact_first_token(
        &self,
        tokens: &BTreeSet<String>,
        level: IndexLevel,
    ) -> Result<BTreeMap<String, Vec<IndexEntry>>> {
        lookup_with(self, tokens, level, IndexEntry::decode_first_token)
    }
}

fn lookup_with<S, F>(
    storage: &S,
    tokens: &BTreeSet<String>,
    level: IndexLevel,
    decode: F,
) -> Result<BTreeMap<String, Vec<IndexEntry>>>
where
    S: StorageBackend + ?Sized,
    F: Fn(&[u8]) -> Result<IndexEntry>,
{
    if tokens.is_empty() {
        return Ok(BTreeMap::new());
    }

    let raw = storage.get_postings_batch(level, tokens)?;
    let mut decoded = BTreeMap::new();
    let mut skipped = 0usize;

    for (token, postings) in raw {
        let entries: Vec<IndexEntry> = postings
            .iter()
            .filter_map(|posting| match decode(posting) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping entry for {:?} in level {}: {}", token, level, e);
                    skipped += 1;
                    None
                }
            })
            .collect();
        if !entries.is_empty() {
            decoded.insert(token, entries);
        }
    }

    if skipped > 0 {
        debug!("Skipped {} malformed entries in level {}", skipped, level);
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn set(tokens: &[&str]) -> BTreeSet<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn empty_token_set_gives_empty_map() {
        let storage = MemoryStorage::new();
        assert!(storage.lookup_exact_case_sensitive(&BTreeSet::new(), IndexLevel::Aliases).unwrap().is_empty());
        assert!(storage.lookup_exact_first_token(&BTreeSet::new(), IndexLevel::CiAliases).unwrap().is_empty());
        assert_eq!(storage.metrics().get_stats().read_operations, 0);
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let storage = MemoryStorage::new();
        storage.store_postings_batch(IndexLevel::CiAliases, &[
            ("biological".to_string(), IndexEntry::encode_first_token("go:GO:0008150", "GO", "Biological process")),
            ("biological".to_string(), b"go:GO:1\x1EGO".to_vec()),
            ("broken".to_string(), b"garbage".to_vec()),
        ]).unwrap();

        let hits = storage.lookup_exact_first_token(&set(&["biological", "broken"]), IndexLevel::CiAliases).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits["biological"].len(), 1);
        assert_eq!(hits["biological"][0].embedded_name.as_deref(), Some("Biological process"));
    }

    #[test]
    fn case_sensitive_lookup_is_exact() {
        let storage = MemoryStorage::new();
        storage.store_postings_batch(IndexLevel::Aliases, &[
            ("Coxiella".to_string(), IndexEntry::encode_alias("uniprot:entity1", "UniProt")),
        ]).unwrap();

        let hits = storage.lookup_exact_case_sensitive(&set(&["Coxiella", "coxiella"]), IndexLevel::Aliases).unwrap();
        assert_eq!(hits.keys().collect::<Vec<_>>(), vec!["Coxiella"]);
        assert_eq!(hits["Coxiella"][0].entity_id.as_str(), Some("entity1"));
    }
}
