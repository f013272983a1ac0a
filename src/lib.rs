//! translatron resolves free text against an index of named entities and
//! documents. Its core is a mention matcher that finds multi-word entity
//! names using only single-token index lookups, next to a prefix-based
//! document search and the indexers that build both indexes.

// Module declarations
pub mod error;
pub mod parser;
pub mod storage;
pub mod index;
pub mod matcher;
pub mod search;
pub mod indexer;
pub mod service;
pub mod utils;
pub mod config;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use matcher::{MentionLink, MentionMatcher, MentionResult};
pub use search::{DocumentSearch, EntitySearch};
pub use indexer::{DocumentIndexer, EntityIndexer};
pub use service::RequestHandler;
pub use types::{Document, Entity};

// Re-export the config from config module
pub use config::TranslatronConfig;
