// src/config/subsystems/pipeline.rs

use serde::{Serialize, Deserialize};
use std::time::Duration;
use log::info;
use crate::error::{Error, Result};
use crate::config::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Requested number of scoring workers, capped by available cores
    pub parallelism: usize,
    /// Candidates in flight between reader and workers
    pub queue_capacity: usize,
    /// How long the writer waits on one candidate before warning
    pub stall_warning_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallelism: num_cpus::get(),
            queue_capacity: 1000,
            stall_warning_secs: 60,
        }
    }
}

impl FromIni for PipelineConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "pipeline" {
            return None;
        }

        match key {
            "parallelism" => {
                match value.parse() {
                    Ok(count) if count > 0 => {
                        self.parallelism = count;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid parallelism (at least 1 worker must be allowed): {}", value)
                    ))),
                }
            },
            "queue_capacity" => {
                match value.parse() {
                    Ok(capacity) if capacity > 0 => {
                        self.queue_capacity = capacity;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid queue_capacity (must be > 0): {}", value)
                    ))),
                }
            },
            "stall_warning_secs" => {
                match value.parse() {
                    Ok(secs) if secs > 0 => {
                        self.stall_warning_secs = secs;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid stall_warning_secs (must be > 0): {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(Error::Config("At least 1 worker must be allowed".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(Error::Config("queue_capacity must be greater than 0".to_string()));
        }
        if self.stall_warning_secs == 0 {
            return Err(Error::Config("stall_warning_secs must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// Worker count actually used: the configured value, capped by the cores present.
    pub fn effective_workers(&self) -> usize {
        let cores = num_cpus::get();
        let workers = self.parallelism.min(cores).max(1);
        if workers < self.parallelism {
            info!("Capping parallelism at {} (requested {})", workers, self.parallelism);
        }
        workers
    }

    pub fn stall_warning(&self) -> Duration {
        Duration::from_secs(self.stall_warning_secs)
    }
}
