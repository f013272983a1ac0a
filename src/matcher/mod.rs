pub mod types;
pub mod candidates;
pub mod reconcile;
pub mod engine;

// Re-export the main types
pub use self::engine::{MentionMatcher, resolve_mentions};
pub use self::types::{
    CandidateMention,
    MatchOrigin,
    MentionLink,
    MentionResult,
};
