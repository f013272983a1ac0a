// src/config/subsystems/parser.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_positive};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// All-digit tokens up to this many characters never reach an entity
    /// lookup. They are almost always accession numbers.
    pub max_numeric_token_len: usize,

    /// Document tokens this short or shorter are not indexed
    pub max_short_token_len: usize,

    pub stop_words_file: Option<PathBuf>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_numeric_token_len: 5,
            max_short_token_len: 2,
            stop_words_file: None,
        }
    }
}

impl FromIni for ParserConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "parser" {
            return None;
        }

        match key {
            "max_numeric_token_len" => {
                match value.parse() {
                    Ok(len) => {
                        self.max_numeric_token_len = len;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid max_numeric_token_len: {}", value)
                    ))),
                }
            },
            "max_short_token_len" => parse_positive(&mut self.max_short_token_len, key, value),
            "stop_words_file" => {
                let file_path = PathBuf::from(value.trim_matches('"'));
                self.stop_words_file = Some(file_path);
                Some(Ok(()))
            },
            _ => None,
        }
    }
}

impl ParserConfig {
    pub fn validate(&self) -> Result<()> {
        // Only warn if the file is missing; indexing still works without it
        if let Some(path) = &self.stop_words_file {
            if !path.exists() {
                log::warn!("Stop words file not found: {:?}", path);
            }
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        let mut description = vec![
            format!("skipping numeric lookup tokens of <= {} chars", self.max_numeric_token_len),
            format!("skipping document tokens of <= {} chars", self.max_short_token_len),
        ];
        if let Some(path) = &self.stop_words_file {
            description.push(format!("using stop words from {:?}", path));
        }
        description.join(", ")
    }
}
