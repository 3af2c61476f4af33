// src/config/subsystems/logging.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use log::LevelFilter;
use crate::error::{Error, Result};
use crate::config::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub to_file: bool,
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            to_file: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Maps a config level name onto a filter; `none` turns logging off.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim_matches('"').to_lowercase().as_str() {
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        "none" => Some(LevelFilter::Off),
        _ => None,
    }
}

impl FromIni for LoggingConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "logging" {
            return None;
        }

        match key {
            "level" => {
                if parse_level(value).is_some() {
                    self.level = value.trim_matches('"').to_lowercase();
                    Some(Ok(()))
                } else {
                    Some(Err(Error::Config(
                        format!("Invalid log level (error/warn/info/debug/trace/none): {}", value)
                    )))
                }
            },
            "to_file" => {
                match value.parse() {
                    Ok(flag) => {
                        self.to_file = flag;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid to_file value (must be true/false): {}", value)
                    ))),
                }
            },
            "log_dir" => {
                self.log_dir = PathBuf::from(value.trim_matches('"'));
                Some(Ok(()))
            },
            _ => None,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        if parse_level(&self.level).is_none() {
            return Err(Error::Config(format!("Invalid log level: {}", self.level)));
        }
        Ok(())
    }

    pub fn level_filter(&self) -> LevelFilter {
        parse_level(&self.level).unwrap_or(LevelFilter::Info)
    }
}
