pub mod parser;
pub mod matcher;
pub mod search;
pub mod storage;
pub mod logging;

pub use parser::ParserConfig;
pub use matcher::MatcherConfig;
pub use search::SearchConfig;
pub use storage::StorageConfig;
pub use logging::LoggingConfig;
