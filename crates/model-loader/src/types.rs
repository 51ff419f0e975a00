//! Core domain types for a persisted ALS model.
//!
//! A trained model is two dense factor tables (one row per user, one row per
//! item, each row `rank` floats wide) plus a small metadata record describing
//! how it was trained and which column names it expects.

use crate::error::{ModelLoadError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Opaque user identifier (hashed upstream into a 32-bit integer)
pub type UserId = i32;

/// Opaque item identifier, only ever produced by the model
pub type ItemId = i32;

/// Fully qualified class name written by the trainer for ALS models
pub const ALS_MODEL_CLASS: &str = "org.apache.spark.ml.recommendation.ALSModel";

// =============================================================================
// Metadata
// =============================================================================

/// Contents of `metadata/part-00000`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_version: Option<String>,
    pub uid: String,
    pub rank: usize,
    #[serde(default)]
    pub param_map: ParamMap,
}

impl ModelMetadata {
    /// Metadata for a fresh model of the given rank with default columns
    pub fn new(uid: impl Into<String>, rank: usize) -> Self {
        Self {
            class: ALS_MODEL_CLASS.to_string(),
            timestamp: None,
            spark_version: None,
            uid: uid.into(),
            rank,
            param_map: ParamMap::default(),
        }
    }
}

/// Column names and strategy the model was trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamMap {
    #[serde(default = "default_user_col")]
    pub user_col: String,
    #[serde(default = "default_item_col")]
    pub item_col: String,
    #[serde(default = "default_prediction_col")]
    pub prediction_col: String,
    #[serde(default = "default_cold_start_strategy")]
    pub cold_start_strategy: String,
}

fn default_user_col() -> String {
    "user".to_string()
}

fn default_item_col() -> String {
    "item".to_string()
}

fn default_prediction_col() -> String {
    "prediction".to_string()
}

fn default_cold_start_strategy() -> String {
    "nan".to_string()
}

impl Default for ParamMap {
    fn default() -> Self {
        Self {
            user_col: default_user_col(),
            item_col: default_item_col(),
            prediction_col: default_prediction_col(),
            cold_start_strategy: default_cold_start_strategy(),
        }
    }
}

/// One line of a `userFactors` / `itemFactors` part file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRecord {
    pub id: i32,
    pub features: Vec<f32>,
}

/// Resource limits applied while loading.
///
/// `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadLimits {
    /// Upper bound on the in-memory size of the loaded model
    pub max_model_bytes: Option<u64>,
    /// Upper bound on the size of any single serialized record
    pub max_record_bytes: Option<u64>,
}

// =============================================================================
// FactorTable
// =============================================================================

/// Dense, row-major factor matrix with an id lookup.
#[derive(Debug, Clone, Default)]
pub struct FactorTable {
    pub(crate) ids: Vec<i32>,
    pub(crate) positions: HashMap<i32, usize>,
    pub(crate) values: Vec<f32>,
}

impl FactorTable {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: i32) -> bool {
        self.positions.contains_key(&id)
    }

    /// Ids in insertion order
    pub fn ids(&self) -> &[i32] {
        &self.ids
    }

    /// Factor row for `id`, if present
    pub fn get(&self, id: i32, rank: usize) -> Option<&[f32]> {
        let pos = *self.positions.get(&id)?;
        Some(&self.values[pos * rank..(pos + 1) * rank])
    }

    /// Row at position `pos` (insertion order)
    pub fn row(&self, pos: usize, rank: usize) -> &[f32] {
        &self.values[pos * rank..(pos + 1) * rank]
    }

    fn push(&mut self, table: &'static str, id: i32, features: &[f32]) -> Result<()> {
        if self.positions.contains_key(&id) {
            return Err(ModelLoadError::DuplicateId { table, id });
        }
        self.positions.insert(id, self.ids.len());
        self.ids.push(id);
        self.values.extend_from_slice(features);
        Ok(())
    }
}

// =============================================================================
// AlsModel
// =============================================================================

/// An in-memory ALS model.
///
/// Built either by [`AlsModel::load`] from a persisted directory or
/// incrementally with [`AlsModel::new`] and the insert methods.
#[derive(Debug, Clone)]
pub struct AlsModel {
    pub(crate) metadata: ModelMetadata,
    pub(crate) user_factors: FactorTable,
    pub(crate) item_factors: FactorTable,
}

impl AlsModel {
    /// Creates an empty model
    pub fn new(metadata: ModelMetadata) -> Self {
        Self {
            metadata,
            user_factors: FactorTable::default(),
            item_factors: FactorTable::default(),
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn rank(&self) -> usize {
        self.metadata.rank
    }

    /// Name of the user column the model was trained on
    pub fn user_col(&self) -> &str {
        &self.metadata.param_map.user_col
    }

    pub fn item_col(&self) -> &str {
        &self.metadata.param_map.item_col
    }

    pub fn user_factors(&self) -> &FactorTable {
        &self.user_factors
    }

    pub fn item_factors(&self) -> &FactorTable {
        &self.item_factors
    }

    /// Latent factors for a user
    pub fn get_user_factors(&self, user_id: UserId) -> Option<&[f32]> {
        self.user_factors.get(user_id, self.rank())
    }

    /// Latent factors for an item
    pub fn get_item_factors(&self, item_id: ItemId) -> Option<&[f32]> {
        self.item_factors.get(item_id, self.rank())
    }

    /// Predicted rating for a single (user, item) pair.
    ///
    /// Returns `None` when either side is unknown to the model.
    pub fn predict(&self, user_id: UserId, item_id: ItemId) -> Option<f32> {
        let user = self.get_user_factors(user_id)?;
        let item = self.get_item_factors(item_id)?;
        Some(dot(user, item))
    }

    /// Add a user factor row; fails on wrong length, non-finite values or duplicates
    pub fn insert_user_factors(&mut self, user_id: UserId, features: &[f32]) -> Result<()> {
        check_row("user", user_id, features, self.rank())?;
        self.user_factors.push("user", user_id, features)
    }

    /// Add an item factor row; fails on wrong length, non-finite values or duplicates
    pub fn insert_item_factors(&mut self, item_id: ItemId, features: &[f32]) -> Result<()> {
        check_row("item", item_id, features, self.rank())?;
        self.item_factors.push("item", item_id, features)
    }

    /// (users, items) counts for logging
    pub fn counts(&self) -> (usize, usize) {
        (self.user_factors.len(), self.item_factors.len())
    }

    /// Approximate resident size in bytes: factor values, ids and lookup entries
    pub fn estimated_bytes(&self) -> u64 {
        estimate_bytes(self.user_factors.len() + self.item_factors.len(), self.rank())
    }
}

/// Approximate resident size of `rows` factor rows of width `rank`
pub(crate) fn estimate_bytes(rows: usize, rank: usize) -> u64 {
    // f32 values + i32 id + (i32, usize) map entry; saturates on corrupt ranks
    let per_row = (rank as u64).saturating_mul(4).saturating_add(4 + 16);
    (rows as u64).saturating_mul(per_row)
}

pub(crate) fn check_row(table: &'static str, id: i32, features: &[f32], rank: usize) -> Result<()> {
    if features.len() != rank {
        return Err(ModelLoadError::RankMismatch {
            table,
            id,
            expected: rank,
            found: features.len(),
        });
    }
    if let Some(bad) = features.iter().find(|v| !v.is_finite()) {
        return Err(ModelLoadError::InvalidValue {
            field: format!("{table} factor for id {id}"),
            value: bad.to_string(),
        });
    }
    Ok(())
}

/// Dot product of two equally sized factor rows
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
