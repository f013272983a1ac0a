// search/mod.rs

pub mod documents;
pub mod entities;

pub use self::documents::{DocumentHit, DocumentSearch, get_documents, paragraph_window};
pub use self::entities::EntitySearch;
