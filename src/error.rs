use thiserror::Error;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A row in an input table does not have the shape the header promises.
    #[error("Corrupt input in {path:?} at line {line}: expected {expected} columns, found {found}")]
    CorruptInput {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Search index error: {0}")]
    Search(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

// Type alias for Result
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error conversions
impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn search<S: Into<String>>(msg: S) -> Self {
        Error::Search(msg.into())
    }

    pub fn pipeline<S: Into<String>>(msg: S) -> Self {
        Error::Pipeline(msg.into())
    }

    pub fn corrupt<P: Into<PathBuf>>(path: P, line: usize, expected: usize, found: usize) -> Self {
        Error::CorruptInput {
            path: path.into(),
            line,
            expected,
            found,
        }
    }
}

impl From<tantivy::TantivyError> for Error {
    fn from(err: tantivy::TantivyError) -> Self {
        Error::Search(err.to_string())
    }
}

impl From<ctrlc::Error> for Error {
    fn from(err: ctrlc::Error) -> Self {
        Error::Config(format!("Failed to install interrupt handler: {}", err))
    }
}
