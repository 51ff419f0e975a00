//! Persisting an [`AlsModel`] in the directory layout [`AlsModel::load`] reads.

use crate::error::{ModelLoadError, Result};
use crate::parser::{ITEM_FACTORS_DIR, METADATA_DIR, USER_FACTORS_DIR};
use crate::types::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const PART_FILE: &str = "part-00000";

impl AlsModel {
    /// Write the model to `model_dir`, replacing any existing part files
    pub fn save(&self, model_dir: impl AsRef<Path>) -> Result<()> {
        let model_dir = model_dir.as_ref();

        let metadata_dir = model_dir.join(METADATA_DIR);
        fs::create_dir_all(&metadata_dir).map_err(|e| ModelLoadError::io(&metadata_dir, e))?;
        let metadata_path = metadata_dir.join(PART_FILE);
        let mut line = serde_json::to_string(&self.metadata)?;
        line.push('\n');
        fs::write(&metadata_path, line).map_err(|e| ModelLoadError::io(&metadata_path, e))?;

        write_table(&model_dir.join(USER_FACTORS_DIR), &self.user_factors, self.rank())?;
        write_table(&model_dir.join(ITEM_FACTORS_DIR), &self.item_factors, self.rank())?;
        Ok(())
    }
}

fn write_table(dir: &Path, table: &FactorTable, rank: usize) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| ModelLoadError::io(dir, e))?;
    let path = dir.join(PART_FILE);
    let file = File::create(&path).map_err(|e| ModelLoadError::io(&path, e))?;
    let mut out = BufWriter::new(file);

    for (pos, &id) in table.ids().iter().enumerate() {
        let record = FactorRecord {
            id,
            features: table.row(pos, rank).to_vec(),
        };
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n").map_err(|e| ModelLoadError::io(&path, e))?;
    }
    out.flush().map_err(|e| ModelLoadError::io(&path, e))?;
    Ok(())
}
