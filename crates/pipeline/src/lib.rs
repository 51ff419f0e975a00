//! Post-processing and reporting for generated recommendations.
//!
//! This crate provides:
//! - PostProcessor trait and the ClampRatings implementation
//! - PostProcessPipeline for composing processors
//! - Report formatting for the final per-user summary lines
//!
//! ## Architecture
//! Rows arrive fully materialized from the recommender:
//! 1. Processors rewrite them (ratings clamped to the 1-5 scale)
//! 2. The report formats every row into a summary line
//! 3. Lines are written only after all of them have been formatted
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{ClampRatings, PostProcessPipeline, report};
//!
//! let pipeline = PostProcessPipeline::new().add_processor(ClampRatings::default());
//! let clamped = pipeline.apply(rows)?;
//!
//! let lines = report::format_report(&clamped);
//! report::write_report(&mut std::io::stdout(), &lines)?;
//! ```

pub mod traits;
pub mod clamp;
pub mod post_process;
pub mod report;

// Re-export main types
pub use traits::PostProcessor;
pub use clamp::{BoundsError, ClampRatings, ScoreBounds, clamp_rating};
pub use post_process::PostProcessPipeline;
