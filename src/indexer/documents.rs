// indexer/documents.rs

use std::sync::Arc;
use log::debug;
use rayon::prelude::*;

use crate::error::Result;
use crate::index::ENTRY_SEPARATOR;
use crate::parser::DocumentTokenizer;
use crate::storage::{IndexLevel, RecordTable, StorageBackend};
use crate::types::Document;
use super::IndexingStats;

/// Hit location `<docId>\x1E<part>` stored in the document levels
pub fn encode_location(doc_id: &str, part: &str) -> Vec<u8> {
    let mut raw = Vec::with_capacity(doc_id.len() + part.len() + 1);
    raw.extend_from_slice(doc_id.as_bytes());
    raw.push(ENTRY_SEPARATOR);
    raw.extend_from_slice(part.as_bytes());
    raw
}

/// Writes document words into the `title` and `content` levels and the
/// document itself into the document table.
pub struct DocumentIndexer<S: ?Sized> {
    storage: Arc<S>,
    tokenizer: DocumentTokenizer,
}

impl<S: StorageBackend + ?Sized> DocumentIndexer<S> {
    pub fn new(storage: Arc<S>, tokenizer: DocumentTokenizer) -> Self {
        Self { storage, tokenizer }
    }

    pub fn index_document(&self, doc: &Document) -> Result<IndexingStats> {
        self.index_documents(std::slice::from_ref(doc))
    }

    pub fn index_documents(&self, docs: &[Document]) -> Result<IndexingStats> {
        let mut title_postings = Vec::new();
        let mut content_postings = Vec::new();
        let mut records = Vec::with_capacity(docs.len());
        let mut stats = IndexingStats::default();

        for doc in docs {
            if doc.id.is_empty() {
                stats.skipped += 1;
                continue;
            }

            let title_location = encode_location(&doc.id, "title");
            title_postings.extend(
                self.tokenizer
                    .index_words(&doc.title)
                    .into_iter()
                    .map(|word| (word, title_location.clone())),
            );

            let paragraph_postings: Vec<(String, Vec<u8>)> = doc
                .paragraphs
                .par_iter()
                .enumerate()
                .flat_map_iter(|(i, paragraph)| {
                    let location = encode_location(&doc.id, &format!("paragraph{}", i));
                    self.tokenizer
                        .index_words(paragraph)
                        .into_iter()
                        .map(move |word| (word, location.clone()))
                })
                .collect();
            content_postings.extend(paragraph_postings);

            records.push((doc.id.clone(), serde_json::to_vec(doc)?));
            stats.records += 1;
        }

        stats.postings = title_postings.len() + content_postings.len();
        self.storage.store_postings_batch(IndexLevel::Title, &title_postings)?;
        self.storage.store_postings_batch(IndexLevel::Content, &content_postings)?;
        self.storage.store_records_batch(RecordTable::Documents, &records)?;

        debug!("Indexed {} documents with {} postings", stats.records, stats.postings);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use crate::storage::MemoryStorage;

    #[test]
    fn paragraphs_get_their_own_locations() {
        let storage = Arc::new(MemoryStorage::new());
        let indexer = DocumentIndexer::new(Arc::clone(&storage), DocumentTokenizer::new_with_defaults());
        let doc = Document::new(
            "PMC1",
            "Q fever outbreak",
            vec!["Coxiella burnetii causes fever.".to_string(), "Treatment with doxycycline".to_string()],
        );
        indexer.index_document(&doc).unwrap();

        let tokens: BTreeSet<String> = ["fever".to_string(), "doxycycline".to_string()].into_iter().collect();
        let content = storage.get_postings_batch(IndexLevel::Content, &tokens).unwrap();
        assert_eq!(content["fever"], vec![encode_location("PMC1", "paragraph0")]);
        assert_eq!(content["doxycycline"], vec![encode_location("PMC1", "paragraph1")]);

        let title = storage.get_postings_batch(IndexLevel::Title, &tokens).unwrap();
        assert_eq!(title["fever"], vec![encode_location("PMC1", "title")]);
        assert_eq!(storage.get_stats().unwrap().total_documents, 1);
    }
}
