pub mod mention;
pub mod document;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
   #[error("IO error: {0}")]
   IoError(#[from] std::io::Error),

   #[error("Regex error: {0}")]
   RegexError(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, ParserError>;

/// One surface token of a query or document.
///
/// `surface` is the text exactly as it appeared in the input and is what
/// mention spans are rebuilt from; `lowered` is only ever used for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
   pub surface: String,
   pub lowered: String,
   pub position: usize,
}

impl Token {
   pub fn new<S: Into<String>>(surface: S, position: usize) -> Self {
      let surface = surface.into();
      let lowered = surface.to_lowercase();
      Self { surface, lowered, position }
   }
}

pub trait TextTokenizer: Sync + Send {
    /// Split text into tokens, keeping every token and its position
    fn tokenize(&self, text: &str) -> Vec<Token>;

    /// Whether a token may be used as an index key
    fn is_index_token(&self, token: &Token) -> bool;

    /// Tokens that survive the index filter, in input order
    fn index_tokens<'a>(&self, tokens: &'a [Token]) -> Vec<&'a Token> {
        tokens.iter().filter(|t| self.is_index_token(t)).collect()
    }
}

pub use self::mention::MentionTokenizer;
pub use self::document::DocumentTokenizer;
