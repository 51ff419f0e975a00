//! Error types for the model-loader crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, validating or saving an ALS model.
///
/// Every variant means the model is unusable as a whole; the loader never
/// hands back a partially populated model.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    /// Model directory or one of its required parts does not exist
    #[error("Model path not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// I/O error occurred while reading or writing an artifact file
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record in an artifact file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// Metadata describes something other than an ALS model
    #[error("Unsupported model class: {0}")]
    UnsupportedClass(String),

    /// Factor vector length disagrees with the model rank
    #[error("Incompatible schema: {table} factor for id {id} has {found} features, expected rank {expected}")]
    RankMismatch {
        table: &'static str,
        id: i32,
        expected: usize,
        found: usize,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The same id appears twice in one factor table
    #[error("Duplicate {table} id {id}")]
    DuplicateId { table: &'static str, id: i32 },

    /// A single serialized record is larger than the serializer buffer
    #[error("Record at line {line} in {file} is {size} bytes, buffer limit is {limit} bytes")]
    RecordTooLarge {
        file: String,
        line: usize,
        size: usize,
        limit: u64,
    },

    /// The model would not fit into the configured driver memory
    #[error("Model needs ~{required} bytes but driver memory is {available} bytes")]
    ExceedsMemory { required: u64, available: u64 },

    /// Metadata (de)serialization failed
    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl ModelLoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ModelLoadError::NotFound { path }
        } else {
            ModelLoadError::Io { path, source }
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ModelLoadError>;
