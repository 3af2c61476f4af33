// src/config/subsystems/analyzer.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::FromIni;
use crate::scoring::counter::MAX_SEARCH_COUNT;

/// Candidates matched in fewer documents than this are too rare to disambiguate.
pub const MINIMUM_MENTIONS: usize = 20;

/// Absolute floor of the adaptive minimum support.
pub const MIN_SUPPORT: u32 = 200;

/// Weight given to an exact anchor match relative to plain co-occurrence.
pub const EXACT_BOOST: u32 = 16;

/// Largest boost for which a full document cap of exact hits still fits in `u32`.
pub const MAX_EXACT_BOOST: u32 = u32::MAX / MAX_SEARCH_COUNT - 1;

/// Catches a census category that links from almost every US place article.
pub const DEFAULT_BLACKLIST: &[&str] = &["Q2035701|Race and ethnicity in the United States Census"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub minimum_mentions: usize,
    pub min_support: u32,
    /// Number of top-ranked documents retrieved per candidate
    pub max_documents: usize,
    pub exact_boost: u32,
    pub blacklist: Vec<String>,
    /// Initial interner size; 0 lets it grow on demand
    pub interner_capacity: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            minimum_mentions: MINIMUM_MENTIONS,
            min_support: MIN_SUPPORT,
            max_documents: MAX_SEARCH_COUNT as usize,
            exact_boost: EXACT_BOOST,
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            interner_capacity: 0,
        }
    }
}

impl FromIni for AnalyzerConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "analyzer" {
            return None;
        }

        match key {
            "minimum_mentions" => {
                match value.parse() {
                    Ok(count) if count > 0 => {
                        self.minimum_mentions = count;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid minimum_mentions (must be > 0): {}", value)
                    ))),
                }
            },
            "min_support" => {
                match value.parse() {
                    Ok(support) => {
                        self.min_support = support;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid min_support (must be a non-negative integer): {}", value)
                    ))),
                }
            },
            "max_documents" => {
                match value.parse::<usize>() {
                    Ok(limit) if limit > 0 && limit <= MAX_SEARCH_COUNT as usize => {
                        self.max_documents = limit;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid max_documents (must be between 1 and {}): {}", MAX_SEARCH_COUNT, value)
                    ))),
                }
            },
            "exact_boost" => {
                match value.parse() {
                    Ok(boost) if boost > 0 && boost <= MAX_EXACT_BOOST => {
                        self.exact_boost = boost;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid exact_boost (must be between 1 and {}): {}", MAX_EXACT_BOOST, value)
                    ))),
                }
            },
            "blacklist" => {
                self.blacklist = value
                    .trim_matches('"')
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                Some(Ok(()))
            },
            "interner_capacity" => {
                match value.parse() {
                    Ok(capacity) => {
                        self.interner_capacity = capacity;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid interner_capacity: {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.minimum_mentions == 0 {
            return Err(Error::Config("minimum_mentions must be greater than 0".to_string()));
        }
        if self.max_documents == 0 || self.max_documents > MAX_SEARCH_COUNT as usize {
            return Err(Error::Config(format!(
                "max_documents must be between 1 and {}", MAX_SEARCH_COUNT
            )));
        }
        if self.minimum_mentions > self.max_documents {
            return Err(Error::Config(format!(
                "minimum_mentions ({}) cannot exceed max_documents ({})",
                self.minimum_mentions, self.max_documents
            )));
        }
        if self.exact_boost == 0 || self.exact_boost > MAX_EXACT_BOOST {
            return Err(Error::Config(format!(
                "exact_boost must be between 1 and {}", MAX_EXACT_BOOST
            )));
        }
        Ok(())
    }
}
