// index/mod.rs

pub mod entry;
pub mod lookup;

pub use self::entry::{Identifier, IndexEntry, ENTRY_SEPARATOR, NAME_SEPARATOR};
pub use self::lookup::EntityLookup;
