// src/config/subsystems/logging.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use log::LevelFilter;
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_flag};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: PathBuf,
    /// Write to a timestamped file in `log_dir` instead of stderr
    pub log_to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            log_to_file: false,
        }
    }
}

impl FromIni for LoggingConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "logging" {
            return None;
        }

        match key {
            "level" => {
                let level = value.trim_matches('"').to_lowercase();
                if Self::parse_level(&level).is_none() {
                    return Some(Err(Error::Config(format!("Invalid log level: {}", value))));
                }
                self.level = level;
                Some(Ok(()))
            },
            "log_dir" => {
                self.log_dir = PathBuf::from(value.trim_matches('"'));
                Some(Ok(()))
            },
            "log_to_file" => parse_flag(&mut self.log_to_file, key, value),
            _ => None,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        if Self::parse_level(&self.level).is_none() {
            return Err(Error::Config(format!("Invalid log level: {}", self.level)));
        }
        Ok(())
    }

    fn parse_level(level: &str) -> Option<LevelFilter> {
        match level {
            "error" => Some(LevelFilter::Error),
            "warn" => Some(LevelFilter::Warn),
            "info" => Some(LevelFilter::Info),
            "debug" => Some(LevelFilter::Debug),
            "trace" => Some(LevelFilter::Trace),
            "none" | "off" => Some(LevelFilter::Off),
            _ => None,
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        Self::parse_level(&self.level).unwrap_or(LevelFilter::Info)
    }
}
