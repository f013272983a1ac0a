// search/entities.rs

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use log::{debug, warn};

use crate::error::Result;
use crate::index::EntityLookup;
use crate::storage::{IndexLevel, RecordTable, StorageBackend};
use crate::types::Entity;

/// Looks up entities by one whole alias, so multi-word names like
/// "Biological process" are found without splitting.
pub struct EntitySearch<S: ?Sized> {
    storage: Arc<S>,
}

impl<S: StorageBackend + ?Sized> EntitySearch<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn search(&self, term: &str) -> Result<Vec<Entity>> {
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let query: BTreeSet<String> = std::iter::once(term.to_string()).collect();
        let hits = self.storage.lookup_exact_case_sensitive(&query, IndexLevel::Aliases)?;
        let Some(entries) = hits.get(term) else {
            return Ok(Vec::new());
        };

        let mut location_ids: Vec<String> = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.location_id.as_str() {
                Some(id) if !location_ids.iter().any(|seen| seen == id) => location_ids.push(id.to_string()),
                Some(_) => {}
                None => debug!("Skipping non UTF-8 location id {}", entry.location_id),
            }
        }

        let records = self.storage.get_records_batch(RecordTable::Entities, &location_ids)?;
        let mut seen = HashSet::new();
        let mut entities = Vec::with_capacity(records.len());
        for (id, bytes) in records {
            match serde_json::from_slice::<Entity>(&bytes) {
                Ok(entity) => {
                    if seen.insert(entity.id.clone()) {
                        entities.push(entity);
                    }
                }
                Err(e) => warn!("Unreadable entity record {:?}: {}", id, e),
            }
        }

        debug!("Entity search for {:?} found {} entities", term, entities.len());
        Ok(entities)
    }
}
