pub mod file;
pub mod subsystems;

use serde::{Serialize, Deserialize};
use std::path::Path;
use std::fs;
use crate::error::Result;
use log::{warn, trace};

pub trait FromIni {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkentConfig {
    // File paths
    pub files: file::FileConfig,

    // Subsystem configs
    pub analyzer: subsystems::AnalyzerConfig,
    pub pipeline: subsystems::PipelineConfig,
    pub logging: subsystems::LoggingConfig,
}

impl LinkentConfig {
    pub fn validate(&self) -> Result<()> {
        self.files.validate()?;
        self.analyzer.validate()?;
        self.pipeline.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    pub fn from_ini<P: AsRef<Path>>(path: P) -> Result<Self> {
        let absolute_path = std::fs::canonicalize(&path)
            .unwrap_or_else(|_| path.as_ref().to_path_buf());

        trace!("Loading configuration from: {:?}", absolute_path);

        let content = fs::read_to_string(&path)?;
        let config = Self::from_ini_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses INI text without touching the filesystem or validating paths.
    pub fn from_ini_str(content: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut current_section = String::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len()-1].trim().to_string();
                trace!("  Line {}: Found section: [{}]", line_num + 1, current_section);
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                if let Some(result) = match current_section.as_str() {
                    "files" => config.files.from_ini_section(&current_section, key, value),
                    "analyzer" => config.analyzer.from_ini_section(&current_section, key, value),
                    "pipeline" => config.pipeline.from_ini_section(&current_section, key, value),
                    "logging" => config.logging.from_ini_section(&current_section, key, value),
                    _ => None,
                } {
                    if let Err(e) = result {
                        warn!("Error processing config key {}={}: {}", key, value, e);
                    }
                } else {
                    warn!("Unrecognized config key: {}={} in section [{}]", key, value, current_section);
                }
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_keeps_defaults_for_bad_values() {
        let ini = r#"
# comment
[files]
wikidata = "data/wikidata.tsv"
output = data/entities.tsv

[analyzer]
minimum_mentions = 5
exact_boost = nope
blacklist = Q1|Foo, Q2|Bar

[pipeline]
parallelism = 3
queue_capacity = 0

[logging]
level = debug
"#;
        let config = LinkentConfig::from_ini_str(ini).unwrap();
        assert_eq!(config.files.wikidata, Path::new("data/wikidata.tsv"));
        assert_eq!(config.files.output, Path::new("data/entities.tsv"));
        assert_eq!(config.analyzer.minimum_mentions, 5);
        assert_eq!(config.analyzer.exact_boost, 16);
        assert_eq!(config.analyzer.blacklist, vec!["Q1|Foo".to_string(), "Q2|Bar".to_string()]);
        assert_eq!(config.pipeline.parallelism, 3);
        assert_eq!(config.pipeline.queue_capacity, 1000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn validation_rejects_missing_input_files() {
        let config = LinkentConfig::from_ini_str("[files]\nwikidata = /definitely/not/here.tsv\n").unwrap();
        assert!(config.validate().is_err());
    }
}
