//! linkent resolves anchor-text phrases to canonical entities using link
//! statistics from a full-text index of a hyperlinked corpus, with
//! cross-lingual identities and redirect closure.

// Module declarations
pub mod error;
pub mod utils;
pub mod config;
pub mod types;
pub mod entities;
pub mod search;
pub mod scoring;
pub mod pipeline;

// Re-exports
pub use error::{Error, Result};
pub use entities::{EntityIdentityMap, RedirectResolver};
pub use scoring::{CandidateEvaluator, SupportCounter};
pub use search::{SearchIndexClient, TantivySearchClient};
pub use pipeline::{CandidatePipeline, PipelineStats};
pub use types::{Candidate, Resolution, Verdict};
pub use utils::StringInterner;

// Re-export the config from config module
pub use config::LinkentConfig;
