//! Core trait for the post-processing pipeline.
//!
//! Post-processors run after recommendations have been materialized locally
//! and rewrite them row by row (clamping ratings, for example).

use anyhow::Result;
use recommender::UserRecommendations;

/// A step applied to materialized recommendation rows.
///
/// ## Design Note
/// - `Send + Sync` allows processors to be shared across threads
/// - Processors take ownership of the rows and return the rewritten rows
pub trait PostProcessor: Send + Sync {
    /// Returns the name of this processor (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this processor to a set of rows.
    ///
    /// # Returns
    /// * `Ok(Vec<UserRecommendations>)` - The processed rows
    /// * `Err` - If processing fails
    fn apply(&self, rows: Vec<UserRecommendations>) -> Result<Vec<UserRecommendations>>;
}
