// indexer/entities.rs

use std::collections::HashMap;
use std::sync::Arc;
use log::{debug, warn};

use crate::error::Result;
use crate::index::IndexEntry;
use crate::storage::{IndexLevel, RecordTable, StorageBackend};
use crate::types::Entity;
use super::IndexingStats;

/// Writes entities into the alias levels and the entity table.
///
/// For a named entity the full name goes to `aliases` as is and its first
/// lower-cased word goes to `cialiases` with the name embedded. Every cross
/// reference alias goes to `aliases` tagged with its own database.
pub struct EntityIndexer<S: ?Sized> {
    storage: Arc<S>,
}

impl<S: StorageBackend + ?Sized> EntityIndexer<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn index_entity(&self, entity: &Entity) -> Result<IndexingStats> {
        self.index_entities(std::slice::from_ref(entity))
    }

    pub fn index_entities(&self, entities: &[Entity]) -> Result<IndexingStats> {
        let mut postings: HashMap<IndexLevel, Vec<(String, Vec<u8>)>> = HashMap::new();
        let mut records = Vec::with_capacity(entities.len());
        let mut stats = IndexingStats::default();

        for entity in entities {
            if entity.id.is_empty() {
                warn!("Skipping entity without id");
                stats.skipped += 1;
                continue;
            }
            for (level, token, entry) in entity_postings(entity) {
                postings.entry(level).or_default().push((token, entry));
                stats.postings += 1;
            }
            records.push((entity.id.clone(), serde_json::to_vec(entity)?));
            stats.records += 1;
        }

        for (level, batch) in &postings {
            self.storage.store_postings_batch(*level, batch)?;
        }
        self.storage.store_records_batch(RecordTable::Entities, &records)?;

        debug!("Indexed {} entities with {} postings", stats.records, stats.postings);
        Ok(stats)
    }
}

/// All `(level, token, raw entry)` triples for one entity
pub fn entity_postings(entity: &Entity) -> Vec<(IndexLevel, String, Vec<u8>)> {
    let mut postings = Vec::new();

    if let Some(name) = entity.name.as_deref().filter(|n| !n.trim().is_empty()) {
        if let Some(first) = name.to_lowercase().split_whitespace().next() {
            postings.push((
                IndexLevel::CiAliases,
                first.to_string(),
                IndexEntry::encode_first_token(&entity.id, &entity.source, name),
            ));
        }
        postings.push((
            IndexLevel::Aliases,
            name.to_string(),
            IndexEntry::encode_alias(&entity.id, &entity.source),
        ));
    }

    for (database, aliases) in &entity.references {
        for alias in aliases.iter().filter(|a| !a.is_empty()) {
            postings.push((
                IndexLevel::Aliases,
                alias.clone(),
                IndexEntry::encode_alias(&entity.id, database),
            ));
        }
    }

    postings
}
