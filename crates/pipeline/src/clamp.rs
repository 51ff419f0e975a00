//! Bounding predicted ratings to the rating scale.
//!
//! ALS predictions are unbounded dot products, so a model trained on 1-5
//! star ratings still predicts values like 6.2 or -0.4. Clamping maps them
//! back onto the scale without touching order or item ids.

use crate::traits::PostProcessor;
use anyhow::Result;
use recommender::UserRecommendations;
use thiserror::Error;

/// Lowest rating on the scale
pub const MIN_RATING: f32 = 1.0;

/// Highest rating on the scale
pub const MAX_RATING: f32 = 5.0;

#[derive(Error, Debug, PartialEq)]
#[error("Invalid rating bounds: min {min} must be finite and not greater than max {max}")]
pub struct BoundsError {
    pub min: f32,
    pub max: f32,
}

/// Inclusive `[min, max]` interval for ratings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBounds {
    min: f32,
    max: f32,
}

impl ScoreBounds {
    pub fn new(min: f32, max: f32) -> Result<Self, BoundsError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(BoundsError { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self {
            min: MIN_RATING,
            max: MAX_RATING,
        }
    }
}

/// `max(min, min(max, score))`; NaN maps to the lower bound
pub fn clamp_rating(score: f32, bounds: ScoreBounds) -> f32 {
    if score.is_nan() {
        return bounds.min;
    }
    score.clamp(bounds.min, bounds.max)
}

/// Post-processor that clamps every rating in every row.
pub struct ClampRatings {
    bounds: ScoreBounds,
}

impl ClampRatings {
    pub fn new(bounds: ScoreBounds) -> Self {
        Self { bounds }
    }
}

impl Default for ClampRatings {
    fn default() -> Self {
        Self::new(ScoreBounds::default())
    }
}

impl PostProcessor for ClampRatings {
    fn name(&self) -> &str {
        "ClampRatings"
    }

    fn apply(&self, mut rows: Vec<UserRecommendations>) -> Result<Vec<UserRecommendations>> {
        for row in &mut rows {
            for rec in &mut row.recommendations {
                rec.rating = clamp_rating(rec.rating, self.bounds);
            }
        }
        Ok(rows)
    }
}
