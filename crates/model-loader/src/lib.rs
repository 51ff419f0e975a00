//! # Model Loader Crate
//!
//! This crate loads a trained ALS (alternating least squares) recommendation
//! model from disk and exposes its user and item factor tables.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (UserId, ItemId, ModelMetadata, AlsModel)
//! - **parser**: Parse metadata and factor part files
//! - **loader**: Build and validate an AlsModel from a directory
//! - **writer**: Persist an AlsModel in the same layout
//! - **error**: Error types for model loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use model_loader::AlsModel;
//!
//! let model = AlsModel::load("spark_recommender_results_hashing/als_model_hashing")?;
//! let (users, items) = model.counts();
//! println!("rank {} model with {} users and {} items", model.rank(), users, items);
//! println!("score: {:?}", model.predict(1698346, 42));
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod loader;
pub mod writer;

// Re-export commonly used types for convenience
pub use error::{ModelLoadError, Result};
pub use types::{
    // Type aliases
    UserId,
    ItemId,
    // Core types
    AlsModel,
    FactorRecord,
    FactorTable,
    LoadLimits,
    ModelMetadata,
    ParamMap,
    // Helpers
    dot,
    ALS_MODEL_CLASS,
};
