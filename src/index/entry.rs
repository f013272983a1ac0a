// index/entry.rs

use std::fmt;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde::ser::SerializeMap;

use crate::error::{Error, Result};

/// Separates the entity location id from the rest of a raw entry
pub const ENTRY_SEPARATOR: u8 = 0x1E;
/// Separates the source database from the embedded full name
pub const NAME_SEPARATOR: u8 = 0x1D;

/// An identifier as stored in the index.
///
/// Identifiers are byte strings. They serialize as plain JSON strings when
/// they are valid UTF-8 and as `{"__class__": "bytes", "__value__": [..]}`
/// otherwise, so nothing is lost on the way to a client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identifier(Vec<u8>);

impl Identifier {
    pub fn new<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&[u8]> for Identifier {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.as_str() {
            Some(text) => serializer.serialize_str(text),
            None => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("__class__", "bytes")?;
                map.serialize_entry("__value__", &self.0)?;
                map.end()
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdentifierRepr {
    Text(String),
    Bytes {
        #[serde(rename = "__class__")]
        class: String,
        #[serde(rename = "__value__")]
        value: Vec<u8>,
    },
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match IdentifierRepr::deserialize(deserializer)? {
            IdentifierRepr::Text(text) => Ok(Identifier::from(text)),
            IdentifierRepr::Bytes { class, value } if class == "bytes" => Ok(Identifier(value)),
            IdentifierRepr::Bytes { class, .. } => Err(serde::de::Error::custom(format!(
                "unsupported identifier class {:?}",
                class
            ))),
        }
    }
}

/// A decoded index entry.
///
/// Raw entries look like `<dbTag>:<id>\x1E<source>` at case-sensitive levels
/// and `<dbTag>:<id>\x1E<source>\x1D<Full Name>` at the first-token level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Entity location id including the database tag
    pub location_id: Identifier,
    /// Location id with the database tag stripped
    pub entity_id: Identifier,
    pub source_database: Identifier,
    pub embedded_name: Option<String>,
}

impl IndexEntry {
    /// Encode an entry for a case-sensitive alias level
    pub fn encode_alias(location_id: &str, source: &str) -> Vec<u8> {
        let mut raw = Vec::with_capacity(location_id.len() + source.len() + 1);
        raw.extend_from_slice(location_id.as_bytes());
        raw.push(ENTRY_SEPARATOR);
        raw.extend_from_slice(source.as_bytes());
        raw
    }

    /// Encode an entry for the first-token level, embedding the full name
    pub fn encode_first_token(location_id: &str, source: &str, name: &str) -> Vec<u8> {
        let mut raw = Self::encode_alias(location_id, source);
        raw.push(NAME_SEPARATOR);
        raw.extend_from_slice(name.as_bytes());
        raw
    }

    /// Decode a case-sensitive alias entry. Anything after the entry
    /// separator is the source database.
    pub fn decode_alias(raw: &[u8]) -> Result<Self> {
        let (location, part) = split_entry(raw)?;
        Ok(Self {
            location_id: Identifier::from(location),
            entity_id: strip_database_tag(location),
            source_database: Identifier::from(part),
            embedded_name: None,
        })
    }

    /// Decode a first-token entry. The name is everything after the last
    /// name separator and must be non-empty UTF-8.
    pub fn decode_first_token(raw: &[u8]) -> Result<Self> {
        let (location, part) = split_entry(raw)?;
        let split = part
            .iter()
            .rposition(|&b| b == NAME_SEPARATOR)
            .ok_or_else(|| Error::malformed(format!("no name separator in {:?}", String::from_utf8_lossy(raw))))?;

        let (source, name) = (&part[..split], &part[split + 1..]);
        let name = std::str::from_utf8(name)
            .map_err(|e| Error::malformed(format!("embedded name is not UTF-8: {}", e)))?;
        if name.trim().is_empty() {
            return Err(Error::malformed("empty embedded name"));
        }

        Ok(Self {
            location_id: Identifier::from(location),
            entity_id: strip_database_tag(location),
            source_database: Identifier::from(source),
            embedded_name: Some(name.to_string()),
        })
    }
}

fn split_entry(raw: &[u8]) -> Result<(&[u8], &[u8])> {
    let split = raw
        .iter()
        .position(|&b| b == ENTRY_SEPARATOR)
        .ok_or_else(|| Error::malformed(format!("no entry separator in {:?}", String::from_utf8_lossy(raw))))?;
    Ok((&raw[..split], &raw[split + 1..]))
}

fn strip_database_tag(location: &[u8]) -> Identifier {
    match location.iter().position(|&b| b == b':') {
        Some(colon) => Identifier::from(&location[colon + 1..]),
        None => {
            debug!("Location id without database tag: {:?}", String::from_utf8_lossy(location));
            Identifier::from(location)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_alias_entries() {
        let raw = IndexEntry::encode_alias("uniprot:P04637", "UniProt");
        let entry = IndexEntry::decode_alias(&raw).unwrap();
        assert_eq!(entry.location_id.as_str(), Some("uniprot:P04637"));
        assert_eq!(entry.entity_id.as_str(), Some("P04637"));
        assert_eq!(entry.source_database.as_str(), Some("UniProt"));
        assert_eq!(entry.embedded_name, None);
    }

    #[test]
    fn only_first_colon_is_the_tag() {
        let entry = IndexEntry::decode_alias(b"go:GO:0008150\x1EGO").unwrap();
        assert_eq!(entry.entity_id.as_str(), Some("GO:0008150"));

        let untagged = IndexEntry::decode_alias(b"P04637\x1EUniProt").unwrap();
        assert_eq!(untagged.entity_id.as_str(), Some("P04637"));
    }

    #[test]
    fn decodes_first_token_entries() {
        let raw = IndexEntry::encode_first_token("go:GO:0008150", "GO", "Biological process");
        let entry = IndexEntry::decode_first_token(&raw).unwrap();
        assert_eq!(entry.entity_id.as_str(), Some("GO:0008150"));
        assert_eq!(entry.source_database.as_str(), Some("GO"));
        assert_eq!(entry.embedded_name.as_deref(), Some("Biological process"));
    }

    #[test]
    fn malformed_entries_are_rejected() {
        assert!(matches!(IndexEntry::decode_alias(b"no separator"), Err(Error::MalformedEntry(_))));
        assert!(matches!(IndexEntry::decode_first_token(b"go:1\x1EGO"), Err(Error::MalformedEntry(_))));
        assert!(matches!(IndexEntry::decode_first_token(b"go:1\x1EGO\x1D"), Err(Error::MalformedEntry(_))));
        assert!(matches!(IndexEntry::decode_first_token(b"go:1\x1EGO\x1D\xff\xfe"), Err(Error::MalformedEntry(_))));
    }

    #[test]
    fn identifiers_serialize_losslessly() {
        let text = Identifier::from("P04637");
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"P04637\"");

        let binary = Identifier::new(vec![0xff, 0x00, 0x41]);
        let json = serde_json::to_value(&binary).unwrap();
        assert_eq!(json, serde_json::json!({"__class__": "bytes", "__value__": [255, 0, 65]}));

        let back: Identifier = serde_json::from_value(json).unwrap();
        assert_eq!(back, binary);
    }
}
