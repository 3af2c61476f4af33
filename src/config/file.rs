// src/config/file.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use crate::error::Result;
use super::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Flat per-language title table (`ID<TAB>lang1<TAB>...`)
    pub wikidata: PathBuf,
    /// Two-column redirect table
    pub redirects: PathBuf,
    /// Candidate phrases, one per line
    pub linktext: PathBuf,
    /// Directory of the full-text index
    pub index_dir: PathBuf,
    pub output: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            wikidata: PathBuf::from("data/wikidata.tsv"),
            redirects: PathBuf::from("data/redirects.tsv"),
            linktext: PathBuf::from("data/linktext.txt"),
            index_dir: PathBuf::from("data/index"),
            output: PathBuf::from("data/entities.tsv"),
        }
    }
}

impl FromIni for FileConfig {
    fn from_ini_section(&mut self, _section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        let path = PathBuf::from(value.trim_matches('"'));
        match key {
            "wikidata" => self.wikidata = path,
            "redirects" => self.redirects = path,
            "linktext" => self.linktext = path,
            "index_dir" => self.index_dir = path,
            "output" => self.output = path,
            _ => return None,
        }
        Some(Ok(()))
    }
}

impl FileConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("wikidata", &self.wikidata),
            ("redirects", &self.redirects),
            ("linktext", &self.linktext),
            ("index_dir", &self.index_dir),
        ] {
            if !path.exists() {
                return Err(crate::error::Error::Config(
                    format!("{} path does not exist: {:?}", name, path)
                ));
            }
        }

        // Create the output directory if it doesn't exist (instead of checking)
        if let Some(parent) = self.output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(())
    }
}
