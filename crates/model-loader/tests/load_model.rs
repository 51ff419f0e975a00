//! Integration tests for loading persisted models from disk.

use model_loader::{AlsModel, LoadLimits, ModelLoadError, ModelMetadata};
use std::fs;
use std::path::PathBuf;

/// Fresh scratch directory per test
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "model-loader-{}-{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn sample_model() -> AlsModel {
    let mut metadata = ModelMetadata::new("ALS_4f1c", 3);
    metadata.param_map.user_col = "userIdInt".to_string();
    metadata.param_map.item_col = "itemIdInt".to_string();
    metadata.spark_version = Some("3.5.1".to_string());

    let mut model = AlsModel::new(metadata);
    model.insert_user_factors(1698346, &[0.9, 0.1, 0.4]).unwrap();
    model.insert_user_factors(3511597, &[0.2, 1.1, -0.3]).unwrap();
    model.insert_item_factors(11, &[1.0, 0.0, 0.0]).unwrap();
    model.insert_item_factors(12, &[0.0, 2.0, 0.5]).unwrap();
    model.insert_item_factors(13, &[3.0, 1.0, 1.0]).unwrap();
    model
}

/// Write a model directory by hand so malformed inputs can be tested
fn write_raw(dir: &PathBuf, metadata: &str, users: &str, items: &str) {
    for (sub, body) in [("metadata", metadata), ("userFactors", users), ("itemFactors", items)] {
        fs::create_dir_all(dir.join(sub)).unwrap();
        fs::write(dir.join(sub).join("part-00000"), body).unwrap();
    }
}

const METADATA: &str = r#"{"class":"org.apache.spark.ml.recommendation.ALSModel","uid":"ALS_raw","rank":2,"paramMap":{"userCol":"userIdInt","itemCol":"itemIdInt"}}"#;

#[test]
fn test_save_then_load_preserves_factors() {
    let dir = scratch_dir("roundtrip");
    let model = sample_model();
    model.save(&dir).unwrap();

    let loaded = AlsModel::load(&dir).unwrap();

    assert_eq!(loaded.counts(), (2, 3));
    assert_eq!(loaded.rank(), 3);
    assert_eq!(loaded.user_col(), "userIdInt");
    assert_eq!(loaded.item_col(), "itemIdInt");
    assert_eq!(loaded.metadata().spark_version.as_deref(), Some("3.5.1"));
    assert_eq!(loaded.get_user_factors(3511597), Some(&[0.2, 1.1, -0.3][..]));
    assert_eq!(loaded.predict(1698346, 13), model.predict(1698346, 13));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_multiple_part_files_and_markers() {
    let dir = scratch_dir("parts");
    write_raw(&dir, METADATA, "{\"id\":1,\"features\":[1.0,0.0]}\n", "");
    fs::write(
        dir.join("userFactors").join("part-00001"),
        "\n{\"id\":2,\"features\":[0.0,1.0]}\n",
    )
    .unwrap();
    fs::write(dir.join("userFactors").join("_SUCCESS"), "").unwrap();
    fs::write(dir.join("itemFactors").join("part-00000"), "{\"id\":5,\"features\":[2.0,3.0]}\n")
        .unwrap();

    let model = AlsModel::load(&dir).unwrap();
    assert_eq!(model.user_factors().ids(), &[1, 2]);
    assert_eq!(model.predict(2, 5), Some(3.0));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_rank_mismatch_is_schema_error() {
    let dir = scratch_dir("rank");
    write_raw(
        &dir,
        METADATA,
        "{\"id\":1,\"features\":[1.0,0.0,5.0]}\n",
        "{\"id\":5,\"features\":[2.0,3.0]}\n",
    );

    let err = AlsModel::load(&dir).unwrap_err();
    assert!(matches!(
        err,
        ModelLoadError::RankMismatch { table: "user", id: 1, expected: 2, found: 3 }
    ));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_wrong_class_is_rejected() {
    let dir = scratch_dir("class");
    write_raw(
        &dir,
        r#"{"class":"org.apache.spark.ml.classification.LogisticRegressionModel","uid":"x","rank":2}"#,
        "",
        "",
    );

    let err = AlsModel::load(&dir).unwrap_err();
    assert!(matches!(err, ModelLoadError::UnsupportedClass(_)));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_malformed_line_reports_location() {
    let dir = scratch_dir("malformed");
    write_raw(&dir, METADATA, "{\"id\":1,\"features\":[1.0,0.0]}\n{\"id\":\n", "");

    match AlsModel::load(&dir).unwrap_err() {
        ModelLoadError::ParseError { file, line, .. } => {
            assert_eq!(file, "userFactors/part-00000");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_factor_directory() {
    let dir = scratch_dir("nofactors");
    fs::create_dir_all(dir.join("metadata")).unwrap();
    fs::write(dir.join("metadata").join("part-00000"), METADATA).unwrap();

    let err = AlsModel::load(&dir).unwrap_err();
    assert!(matches!(err, ModelLoadError::NotFound { .. }));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_limits_are_enforced() {
    let dir = scratch_dir("limits");
    sample_model().save(&dir).unwrap();

    let tiny_buffer = LoadLimits {
        max_model_bytes: None,
        max_record_bytes: Some(8),
    };
    assert!(matches!(
        AlsModel::load_with_limits(&dir, tiny_buffer),
        Err(ModelLoadError::RecordTooLarge { limit: 8, .. })
    ));

    let tiny_memory = LoadLimits {
        max_model_bytes: Some(16),
        max_record_bytes: None,
    };
    assert!(matches!(
        AlsModel::load_with_limits(&dir, tiny_memory),
        Err(ModelLoadError::ExceedsMemory { available: 16, .. })
    ));

    let generous = LoadLimits {
        max_model_bytes: Some(4 << 30),
        max_record_bytes: Some(512 << 20),
    };
    assert!(AlsModel::load_with_limits(&dir, generous).is_ok());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_corrupt_rank_is_load_error() {
    let dir = scratch_dir("huge-rank");
    write_raw(
        &dir,
        r#"{"class":"org.apache.spark.ml.recommendation.ALSModel","uid":"ALS_bad","rank":4611686018427387904}"#,
        "{\"id\":1,\"features\":[1.0,0.0]}\n",
        "{\"id\":5,\"features\":[2.0,3.0]}\n",
    );

    let limits = LoadLimits {
        max_model_bytes: Some(4 << 30),
        max_record_bytes: Some(512 << 20),
    };
    assert!(matches!(
        AlsModel::load_with_limits(&dir, limits),
        Err(ModelLoadError::ExceedsMemory { required: u64::MAX, .. })
    ));
    assert!(matches!(
        AlsModel::load(&dir),
        Err(ModelLoadError::RankMismatch { table: "user", found: 2, .. })
    ));

    fs::remove_dir_all(&dir).unwrap();
}
