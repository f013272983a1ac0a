// search/documents.rs

use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;
use ahash::AHashSet;
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::subsystems::SearchConfig;
use crate::error::Result;
use crate::index::ENTRY_SEPARATOR;
use crate::parser::DocumentTokenizer;
use crate::storage::{IndexLevel, RecordTable, StorageBackend};
use crate::types::Document;

/// A document returned by a search, cut down to the paragraphs around the hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentHit {
    #[serde(flatten)]
    pub document: Document,
    /// Location part of the hit, e.g. `paragraph4` or `title`
    #[serde(rename = "hitLocation")]
    pub hit_location: String,
}

/// Paragraphs shown for a hit at `location` in a document of `paragraph_count` paragraphs.
///
/// For `paragraph<p>` the half-open range `max(0, p-1)..min(n, p+1)`; any
/// other location shows the first `default_window` paragraphs.
pub fn paragraph_window(location: &str, paragraph_count: usize, default_window: usize) -> Range<usize> {
    let paragraph = location
        .strip_prefix("paragraph")
        .and_then(|number| number.parse::<usize>().ok());

    match paragraph {
        Some(p) => {
            let end = paragraph_count.min(p.saturating_add(1));
            let start = p.saturating_sub(1).min(end);
            start..end
        }
        None => 0..paragraph_count.min(default_window),
    }
}

/// Fetch documents by id, skipping ids that are not stored
pub fn get_documents<S: StorageBackend + ?Sized>(storage: &S, ids: &[String]) -> Result<Vec<Document>> {
    let records = storage.get_records_batch(RecordTable::Documents, ids)?;
    Ok(records
        .into_iter()
        .filter_map(|(id, bytes)| match serde_json::from_slice::<Document>(&bytes) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!("Unreadable document record {:?}: {}", id, e);
                None
            }
        })
        .collect())
}

/// Multi-token prefix search over the title, content and metadata levels.
pub struct DocumentSearch<S: ?Sized> {
    storage: Arc<S>,
    tokenizer: DocumentTokenizer,
    config: SearchConfig,
}

impl<S: StorageBackend + ?Sized> DocumentSearch<S> {
    pub fn new(storage: Arc<S>, tokenizer: DocumentTokenizer, config: SearchConfig) -> Self {
        Self { storage, tokenizer, config }
    }

    /// Every query word must prefix-match somewhere in a hit location.
    /// Words that match nothing at all are ignored.
    pub fn search(&self, query: &str) -> Result<Vec<DocumentHit>> {
        let start_time = Instant::now();
        let words = self.tokenizer.query_words(query);

        let locations = self.matching_locations(&words)?;
        let hits = self.resolve_hits(&locations)?;

        info!(
            "Document search for {} tokens found {} hits (took {:?})",
            words.len(),
            hits.len(),
            start_time.elapsed()
        );
        Ok(hits)
    }

    pub fn get_documents(&self, ids: &[String]) -> Result<Vec<Document>> {
        get_documents(&*self.storage, ids)
    }

    fn matching_locations(&self, words: &[String]) -> Result<BTreeSet<Vec<u8>>> {
        let mut matched: Option<AHashSet<Vec<u8>>> = None;

        for word in words {
            let mut word_hits = AHashSet::new();
            for level in IndexLevel::DOCUMENT_LEVELS {
                word_hits.extend(self.storage.get_postings_by_prefix(level, word)?);
            }
            if word_hits.is_empty() {
                debug!("Ignoring query word without hits: {:?}", word);
                continue;
            }
            matched = Some(match matched {
                Some(current) => current.intersection(&word_hits).cloned().collect(),
                None => word_hits,
            });
        }

        Ok(matched
            .unwrap_or_default()
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(self.config.max_results)
            .collect())
    }

    fn resolve_hits(&self, locations: &BTreeSet<Vec<u8>>) -> Result<Vec<DocumentHit>> {
        let mut parsed = Vec::with_capacity(locations.len());
        for raw in locations {
            match split_location(raw) {
                Some(pair) => parsed.push(pair),
                None => debug!("Skipping malformed hit location {:?}", String::from_utf8_lossy(raw)),
            }
        }

        let mut doc_ids: Vec<String> = Vec::new();
        for (doc_id, _) in &parsed {
            if !doc_ids.contains(doc_id) {
                doc_ids.push(doc_id.clone());
            }
        }
        let documents: HashMap<String, Document> = self
            .get_documents(&doc_ids)?
            .into_iter()
            .map(|doc| (doc.id.clone(), doc))
            .collect();

        let mut hits = Vec::with_capacity(parsed.len());
        for (doc_id, location) in parsed {
            let Some(doc) = documents.get(&doc_id) else {
                debug!("Hit in unknown document {:?}", doc_id);
                continue;
            };
            let window = paragraph_window(&location, doc.paragraphs.len(), self.config.default_paragraph_window);
            let mut document = doc.clone();
            document.paragraphs = doc.paragraphs[window].to_vec();
            hits.push(DocumentHit { document, hit_location: location });
        }
        Ok(hits)
    }
}

fn split_location(raw: &[u8]) -> Option<(String, String)> {
    let split = raw.iter().position(|&b| b == ENTRY_SEPARATOR)?;
    let doc_id = std::str::from_utf8(&raw[..split]).ok()?;
    let location = std::str::from_utf8(&raw[split + 1..]).ok()?;
    Some((doc_id.to_string(), location.to_string()))
}
