pub mod analyzer;
pub mod pipeline;
pub mod logging;

pub use analyzer::AnalyzerConfig;
pub use pipeline::PipelineConfig;
pub use logging::LoggingConfig;
