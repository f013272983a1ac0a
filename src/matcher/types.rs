// matcher/types.rs

use std::collections::BTreeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::index::Identifier;

/// Which lookup produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOrigin {
    /// Width-one hit on the case-sensitive alias level
    CaseSensitiveExact,
    /// Full name rebuilt from a lower-cased first-token hit
    CaseInsensitiveReconstructed,
}

/// A possible mention produced for one matching call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMention {
    /// Original-case tokens of the window joined by single spaces
    pub surface_span: String,
    pub start_index: usize,
    pub token_count: usize,
    pub entity_id: Identifier,
    pub source_database: Identifier,
    pub origin: MatchOrigin,
}

impl CandidateMention {
    pub fn link(&self) -> MentionLink {
        MentionLink {
            entity_id: self.entity_id.clone(),
            source_database: self.source_database.clone(),
        }
    }
}

/// The entity a span resolves to. Serializes as `[entityId, sourceDatabase]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionLink {
    pub entity_id: Identifier,
    pub source_database: Identifier,
}

impl MentionLink {
    pub fn new<E: Into<Identifier>, S: Into<Identifier>>(entity_id: E, source_database: S) -> Self {
        Self {
            entity_id: entity_id.into(),
            source_database: source_database.into(),
        }
    }
}

impl Serialize for MentionLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.entity_id, &self.source_database).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MentionLink {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (entity_id, source_database) = <(Identifier, Identifier)>::deserialize(deserializer)?;
        Ok(Self { entity_id, source_database })
    }
}

/// Final mention set: surface span -> exactly one link
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MentionResult(BTreeMap<String, MentionLink>);

impl MentionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, span: &str) -> Option<&MentionLink> {
        self.0.get(span)
    }

    pub fn contains_span(&self, span: &str) -> bool {
        self.0.contains_key(span)
    }

    pub fn spans(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MentionLink)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, MentionLink> {
        self.0
    }
}

impl From<BTreeMap<String, MentionLink>> for MentionResult {
    fn from(map: BTreeMap<String, MentionLink>) -> Self {
        Self(map)
    }
}
