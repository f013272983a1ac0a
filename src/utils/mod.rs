pub mod logger;
pub mod retry;

pub use self::logger::init_logging;
pub use self::retry::{retry_with_backoff, RetryPolicy};
