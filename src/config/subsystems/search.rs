// src/config/subsystems/search.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_positive};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of hit locations returned by a document search
    pub max_results: usize,
    /// Paragraphs shown when a hit carries no paragraph location
    pub default_paragraph_window: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 50,
            default_paragraph_window: 3,
        }
    }
}

impl FromIni for SearchConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "search" {
            return None;
        }

        match key {
            "max_results" => parse_positive(&mut self.max_results, key, value),
            "default_paragraph_window" => parse_positive(&mut self.default_paragraph_window, key, value),
            _ => None,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(Error::config("max_results must be > 0"));
        }
        Ok(())
    }
}
