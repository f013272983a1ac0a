// src/config/subsystems/matcher.rs

use std::time::Duration;
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_positive};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Upper bound for a single index lookup attempt
    pub lookup_timeout_ms: u64,
    /// Attempts per lookup before the query fails as a whole
    pub lookup_retry_attempts: usize,
    /// Base delay of the exponential backoff between attempts
    pub retry_base_delay_ms: u64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: 5000,
            lookup_retry_attempts: 3,
            retry_base_delay_ms: 10,
        }
    }
}

impl FromIni for MatcherConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "matcher" {
            return None;
        }

        match key {
            "lookup_timeout_ms" => parse_positive(&mut self.lookup_timeout_ms, key, value),
            "lookup_retry_attempts" => parse_positive(&mut self.lookup_retry_attempts, key, value),
            "retry_base_delay_ms" => {
                match value.parse() {
                    Ok(delay) => {
                        self.retry_base_delay_ms = delay;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid retry_base_delay_ms: {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lookup_retry_attempts == 0 {
            return Err(Error::config("lookup_retry_attempts must be at least 1"));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(Error::config("lookup_timeout_ms must be > 0"));
        }
        Ok(())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}
