// Word tokenizer for document indexing and document search, with stop word support

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use crate::config::subsystems::ParserConfig;

use super::{TextTokenizer, ParserError, Result, Token};

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\w+|[^\w\s]+").unwrap();
}

/// Splits text into words and punctuation runs.
///
/// The stop word set is read once at construction and never changes
/// afterwards; clone the tokenizer to share it between threads.
#[derive(Debug, Clone)]
pub struct DocumentTokenizer {
    max_short_len: usize,
    stop_words: HashSet<String>,
}

impl DocumentTokenizer {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        let mut tokenizer = Self {
            max_short_len: config.max_short_token_len,
            stop_words: HashSet::new(),
        };
        if let Some(path) = &config.stop_words_file {
            debug!("Loading stop words from config path: {:?}", path);
            tokenizer.load_stop_words(path)?;
        }
        Ok(tokenizer)
    }

    pub fn new_with_defaults() -> Self {
        Self {
            max_short_len: ParserConfig::default().max_short_token_len,
            stop_words: HashSet::new(),
        }
    }

    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words.extend(words.into_iter().map(|w| w.as_ref().trim().to_lowercase()));
        self
    }

    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }

    fn load_stop_words<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        info!("Loading stop words from: {:?}", path_ref);

        let file = match File::open(path_ref) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Stop words file not found, continuing without stop words: {:?}", path_ref);
                return Ok(());
            },
            Err(e) => return Err(ParserError::IoError(e)),
        };

        let reader = io::BufReader::new(file);
        let mut count = 0;
        for line in reader.lines() {
            let word = line?.trim().to_lowercase();
            if !word.is_empty() && !word.starts_with('#') {
                self.stop_words.insert(word);
                count += 1;
            }
        }

        info!("Loaded {} stop words", count);
        Ok(())
    }

    /// Query-side filter for document search: longer than one character and
    /// at least one alphanumeric character.
    pub fn is_query_token(&self, token: &Token) -> bool {
        token.lowered.chars().count() > 1 && token.lowered.chars().any(char::is_alphanumeric)
    }

    /// Lower-cased query words for a document search
    pub fn query_words(&self, text: &str) -> Vec<String> {
        self.tokenize(text)
            .into_iter()
            .filter(|t| self.is_query_token(t))
            .map(|t| t.lowered)
            .collect()
    }

    /// Lower-cased words of a paragraph that go into the document index
    pub fn index_words(&self, text: &str) -> Vec<String> {
        self.tokenize(text)
            .into_iter()
            .filter(|t| self.is_index_token(t))
            .map(|t| t.lowered)
            .collect()
    }
}

impl TextTokenizer for DocumentTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        WORD.find_iter(text)
            .enumerate()
            .map(|(position, m)| Token::new(m.as_str(), position))
            .collect()
    }

    fn is_index_token(&self, token: &Token) -> bool {
        let word = token.lowered.as_str();
        if word.chars().count() <= self.max_short_len {
            return false;
        }
        if word.chars().all(char::is_numeric) || !word.chars().all(char::is_alphanumeric) {
            return false;
        }
        !self.stop_words.contains(word)
    }
}
