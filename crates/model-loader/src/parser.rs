//! Parser for persisted model artifacts.
//!
//! A model directory looks like:
//! - `metadata/part-00000`: a single JSON object ([`ModelMetadata`])
//! - `userFactors/part-*`: JSON lines, one [`FactorRecord`] per line
//! - `itemFactors/part-*`: same layout for items
//!
//! Part files are read in lexicographic order. Hidden files and
//! `_SUCCESS`-style markers (leading `.` or `_`) are ignored.

use crate::error::{ModelLoadError, Result};
use crate::types::*;
use std::fs;
use std::path::{Path, PathBuf};

pub const METADATA_DIR: &str = "metadata";
pub const USER_FACTORS_DIR: &str = "userFactors";
pub const ITEM_FACTORS_DIR: &str = "itemFactors";

/// Parse and validate `metadata/part-00000`
pub fn parse_metadata(model_dir: &Path) -> Result<ModelMetadata> {
    let dir = model_dir.join(METADATA_DIR);
    let files = list_part_files(&dir)?;
    let path = files.first().ok_or_else(|| ModelLoadError::NotFound {
        path: dir.join("part-00000"),
    })?;

    let content = fs::read_to_string(path).map_err(|e| ModelLoadError::io(path, e))?;
    let line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| ModelLoadError::ParseError {
            file: display_name(path),
            line: 1,
            reason: "Empty metadata file".to_string(),
        })?;

    let metadata: ModelMetadata = serde_json::from_str(line)?;

    if metadata.class != ALS_MODEL_CLASS {
        return Err(ModelLoadError::UnsupportedClass(metadata.class));
    }
    if metadata.rank == 0 {
        return Err(ModelLoadError::InvalidValue {
            field: "rank".to_string(),
            value: "0".to_string(),
        });
    }
    Ok(metadata)
}

/// Parse every part file of one factor table directory
///
/// `max_record_bytes` bounds the length of any single line.
pub fn parse_factor_records(
    table_dir: &Path,
    max_record_bytes: Option<u64>,
) -> Result<Vec<FactorRecord>> {
    let mut records = Vec::new();
    for path in list_part_files(table_dir)? {
        parse_factor_file(&path, max_record_bytes, &mut records)?;
    }
    Ok(records)
}

fn parse_factor_file(
    path: &Path,
    max_record_bytes: Option<u64>,
    records: &mut Vec<FactorRecord>,
) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|e| ModelLoadError::io(path, e))?;
    let file = display_name(path);

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        if let Some(limit) = max_record_bytes
            && line_trimmed.len() as u64 > limit
        {
            return Err(ModelLoadError::RecordTooLarge {
                file,
                line: line_no,
                size: line_trimmed.len(),
                limit,
            });
        }

        let record: FactorRecord =
            serde_json::from_str(line_trimmed).map_err(|e| ModelLoadError::ParseError {
                file: file.clone(),
                line: line_no,
                reason: e.to_string(),
            })?;
        records.push(record);
    }
    Ok(())
}

/// Sorted list of data files in a part directory
fn list_part_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| ModelLoadError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ModelLoadError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// "userFactors/part-00000" style name for error messages
fn display_name(path: &Path) -> String {
    let parent = path
        .parent()
        .and_then(Path::file_name)
        .map(|p| p.to_string_lossy().into_owned());
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match parent {
        Some(parent) => format!("{parent}/{name}"),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let path = Path::new("/tmp/model/userFactors/part-00000");
        assert_eq!(display_name(path), "userFactors/part-00000");
    }

    #[test]
    fn test_factor_record_json() {
        let record: FactorRecord =
            serde_json::from_str(r#"{"id": 42, "features": [0.5, -1.25]}"#).unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.features, vec![0.5, -1.25]);
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let err = parse_factor_records(Path::new("/definitely/not/a/model/userFactors"), None)
            .unwrap_err();
        assert!(matches!(err, ModelLoadError::NotFound { .. }));
    }
}
