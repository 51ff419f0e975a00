//! Building an [`AlsModel`] from a persisted directory.

use crate::error::{ModelLoadError, Result};
use crate::parser::{self, ITEM_FACTORS_DIR, USER_FACTORS_DIR};
use crate::types::*;
use std::path::Path;
use tracing::{debug, info, instrument};

impl AlsModel {
    /// Load a model from `model_dir` without resource limits
    pub fn load(model_dir: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_limits(model_dir, LoadLimits::default())
    }

    /// Load a model from `model_dir`
    ///
    /// Steps:
    /// 1. Parse and check metadata
    /// 2. Parse user and item factor tables in parallel
    /// 3. Check the memory estimate against `limits`
    /// 4. Insert rows (rank, finiteness and duplicate checks)
    #[instrument(skip_all, fields(path = %model_dir.as_ref().display()))]
    pub fn load_with_limits(model_dir: impl AsRef<Path>, limits: LoadLimits) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        if !model_dir.is_dir() {
            return Err(ModelLoadError::NotFound {
                path: model_dir.to_path_buf(),
            });
        }

        let metadata = parser::parse_metadata(model_dir)?;
        debug!(uid = %metadata.uid, rank = metadata.rank, "Parsed model metadata");

        let user_dir = model_dir.join(USER_FACTORS_DIR);
        let item_dir = model_dir.join(ITEM_FACTORS_DIR);
        let (users, items) = rayon::join(
            || parser::parse_factor_records(&user_dir, limits.max_record_bytes),
            || parser::parse_factor_records(&item_dir, limits.max_record_bytes),
        );
        let users = users?;
        let items = items?;

        if let Some(available) = limits.max_model_bytes {
            let required = estimate_bytes(users.len() + items.len(), metadata.rank);
            if required > available {
                return Err(ModelLoadError::ExceedsMemory {
                    required,
                    available,
                });
            }
        }

        let mut model = AlsModel::new(metadata);
        for record in users {
            model.insert_user_factors(record.id, &record.features)?;
        }
        for record in items {
            model.insert_item_factors(record.id, &record.features)?;
        }

        let (user_count, item_count) = model.counts();
        info!(
            "Loaded ALS model {} (rank {}): {} users, {} items",
            model.metadata.uid,
            model.rank(),
            user_count,
            item_count
        );
        Ok(model)
    }
}
