use lazy_static::lazy_static;
use regex::Regex;
use crate::config::subsystems::ParserConfig;

use super::{TextTokenizer, Token};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Tokenizer for mention matching.
///
/// Only runs of whitespace separate tokens, so punctuation stays attached
/// and joining a window of tokens with single spaces reproduces the query
/// text up to whitespace normalization.
#[derive(Debug, Clone)]
pub struct MentionTokenizer {
    max_numeric_len: usize,
}

impl MentionTokenizer {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            max_numeric_len: config.max_numeric_token_len,
        }
    }

    pub fn new_with_defaults() -> Self {
        Self::new(&ParserConfig::default())
    }

    /// Short all-digit tokens are database accession numbers far more often
    /// than entity names and are never looked up.
    pub fn is_short_number(&self, token: &str) -> bool {
        token.len() <= self.max_numeric_len && token.bytes().all(|b| b.is_ascii_digit())
    }
}

impl TextTokenizer for MentionTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        WHITESPACE
            .split(text)
            .filter(|part| !part.is_empty())
            .enumerate()
            .map(|(position, part)| Token::new(part, position))
            .collect()
    }

    fn is_index_token(&self, token: &Token) -> bool {
        !self.is_short_number(&token.surface)
    }
}
