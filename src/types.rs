use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};

/// A named entity (protein, MeSH heading, encyclopedia page, ...).
///
/// `id` is the entity location id, i.e. `<dbTag>:<accession>`. Keys the
/// indexer does not understand are carried along in `extra` so that records
/// round-trip unchanged through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub source: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// Cross references: database name -> aliases in that database
    #[serde(rename = "ref", default)]
    pub references: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    pub fn new<I: Into<String>, S: Into<String>>(id: I, source: S) -> Self {
        Self {
            id: id.into(),
            name: None,
            source: source.into(),
            entity_type: None,
            references: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    pub fn with_name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_reference<D: Into<String>>(mut self, database: D, aliases: Vec<String>) -> Self {
        self.references.insert(database.into(), aliases);
        self
    }
}

/// A full-text document (publication, report, ...) split into paragraphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    pub fn new<I: Into<String>, T: Into<String>>(id: I, title: T, paragraphs: Vec<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            paragraphs,
            extra: Map::new(),
        }
    }
}
