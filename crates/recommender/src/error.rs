//! Error types for the recommender crate.

use thiserror::Error;

/// Errors returned by top-N requests
#[derive(Error, Debug)]
pub enum RecommendError {
    /// User table column doesn't match the column the model was trained on
    #[error("User table column '{found}' does not match model user column '{expected}'")]
    ColumnMismatch { expected: String, found: String },

    /// Requested list length must be at least one
    #[error("Number of recommendations must be positive, got {0}")]
    InvalidCount(usize),

    /// Scoring one user needs more memory than one task may use
    #[error("Scoring needs {required} bytes per task but executor memory is {available} bytes")]
    TaskMemoryExceeded { required: u64, available: u64 },
}

pub type Result<T> = std::result::Result<T, RecommendError>;
