//! Error types for loading vocabularies and building counters.

use std::io;

use thiserror::Error;

/// Errors raised while preparing or constructing a counter.
///
/// Every variant is fatal where it is raised. Counting itself never fails.
#[derive(Error, Debug)]
pub enum Error {
    /// The vocabulary file could not be opened or read.
    #[error("Encoding not found: {path}")]
    EncodingNotFound {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A vocabulary line is malformed. `line` is 1-based.
    #[error("Invalid vocabulary file {path} (line {line}): {reason}")]
    InvalidVocabularyFile {
        path: String,
        line: usize,
        reason: &'static str,
    },

    /// A counter was requested for a model that was never loaded.
    #[error("Model not prepared: {0}")]
    ModelNotPrepared(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// An external tokenizer failed to load its model.
    #[error("Prepare failed: {0}")]
    Prepare(String),

    #[error("Failed to open file: {path}")]
    ReadInput {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
