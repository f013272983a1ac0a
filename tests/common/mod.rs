#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;
use translatron::{
    config::subsystems::StorageConfig,
    parser::DocumentTokenizer,
    storage::LMDBStorage,
    Document, DocumentIndexer, Entity, EntityIndexer,
};

pub fn open_storage(dir: &TempDir) -> Arc<LMDBStorage> {
    let config = StorageConfig {
        db_path: dir.path().to_path_buf(),
        lmdb_map_size_mb: Some(64),
        ..StorageConfig::default()
    };
    Arc::new(LMDBStorage::new(dir.path(), config).expect("open LMDB index"))
}

pub fn sample_entities() -> Vec<Entity> {
    vec![
        Entity::new("uniprot:entity1", "UniProt")
            .with_name("Coxiella")
            .with_reference("NCBI", vec!["C. burnetii".to_string()]),
        Entity::new("go:entity2", "GO").with_name("Biological process"),
        Entity::new("wiki:Process", "Wikipedia").with_name("Process"),
        Entity::new("misc:n1", "Misc").with_name("12345"),
        Entity::new("wiki:NYC", "Wikipedia").with_name("New York"),
        Entity::new("wiki:York", "Wikipedia").with_name("York"),
    ]
}

pub fn sample_documents() -> Vec<Document> {
    vec![
        Document::new(
            "PMC1",
            "Q fever in goats",
            (0..6).map(|i| format!("Paragraph {} about goats and sheep.", i)).collect(),
        ),
        Document::new(
            "PMC2",
            "Zoonoses",
            vec![
                "Intro text.".to_string(),
                "Background material.".to_string(),
                "Coxiella burnetii causes fever in humans.".to_string(),
                "Closing remarks.".to_string(),
            ],
        ),
    ]
}

pub fn build_index(dir: &TempDir) -> Arc<LMDBStorage> {
    let storage = open_storage(dir);
    EntityIndexer::new(Arc::clone(&storage))
        .index_entities(&sample_entities())
        .expect("index entities");
    DocumentIndexer::new(Arc::clone(&storage), DocumentTokenizer::new_with_defaults())
        .index_documents(&sample_documents())
        .expect("index documents");
    storage
}
