//! The PostProcessPipeline chains post-processors.

use crate::traits::PostProcessor;
use anyhow::{Context, Result};
use recommender::UserRecommendations;

/// Chains multiple post-processors together.
///
/// ## Usage
/// ```ignore
/// let pipeline = PostProcessPipeline::new()
///     .add_processor(ClampRatings::new(ScoreBounds::default()));
///
/// let clamped = pipeline.apply(rows)?;
/// ```
pub struct PostProcessPipeline {
    processors: Vec<Box<dyn PostProcessor>>,
}

impl PostProcessPipeline {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Add a processor to the pipeline (builder pattern).
    pub fn add_processor(mut self, processor: impl PostProcessor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Apply all processors in insertion order.
    ///
    /// Stops at the first failing processor; no partially processed rows
    /// are returned.
    pub fn apply(&self, rows: Vec<UserRecommendations>) -> Result<Vec<UserRecommendations>> {
        let mut current = rows;
        for processor in &self.processors {
            tracing::debug!(
                "Applying post-processor: {} ({} rows)",
                processor.name(),
                current.len()
            );
            current = processor
                .apply(current)
                .with_context(|| format!("Post-processor {} failed", processor.name()))?;
        }
        Ok(current)
    }
}

impl Default for PostProcessPipeline {
    fn default() -> Self {
        Self::new()
    }
}
