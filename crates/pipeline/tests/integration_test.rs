//! Integration tests for the post-processing pipeline.
//!
//! These tests run real top-N output from a small model through clamping
//! and report formatting.

use model_loader::{AlsModel, ModelMetadata};
use pipeline::report::{format_report, format_user_line};
use pipeline::{ClampRatings, PostProcessPipeline, ScoreBounds};
use recommender::{TopNRecommender, UserTable};
use std::sync::Arc;

const TARGET_USERS: [i32; 3] = [1698346, 3511597, 4902608];

fn create_test_model() -> Arc<AlsModel> {
    let mut metadata = ModelMetadata::new("ALS_pipeline", 2);
    metadata.param_map.user_col = "userIdInt".to_string();
    let mut model = AlsModel::new(metadata);

    // Strong user, weak user, negative user
    model.insert_user_factors(1698346, &[2.0, 1.0]).unwrap();
    model.insert_user_factors(3511597, &[0.5, 0.5]).unwrap();
    model.insert_user_factors(4902608, &[-1.0, 0.2]).unwrap();

    for item in 1..=8 {
        let x = item as f32;
        model.insert_item_factors(item * 100, &[x * 0.4, 1.0 - x * 0.1]).unwrap();
    }
    Arc::new(model)
}

fn clamped_rows() -> Vec<recommender::UserRecommendations> {
    let model = create_test_model();
    let users = UserTable::new(model.user_col(), TARGET_USERS);
    let rows = TopNRecommender::new(model)
        .recommend_for_user_subset(&users, 5)
        .unwrap();

    PostProcessPipeline::new()
        .add_processor(ClampRatings::new(ScoreBounds::default()))
        .apply(rows)
        .unwrap()
}

#[test]
fn test_clamped_ratings_in_range() {
    let rows = clamped_rows();

    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.recommendations.len(), 5);
        for rec in &row.recommendations {
            assert!((1.0..=5.0).contains(&rec.rating), "rating {} out of range", rec.rating);
        }
    }
}

#[test]
fn test_clamping_preserves_ranking() {
    let model = create_test_model();
    let users = UserTable::new(model.user_col(), TARGET_USERS);
    let raw = TopNRecommender::new(model)
        .recommend_for_user_subset(&users, 5)
        .unwrap();
    let clamped = clamped_rows();

    for (before, after) in raw.iter().zip(&clamped) {
        assert_eq!(before.user_id, after.user_id);
        let before_items: Vec<i32> = before.recommendations.iter().map(|r| r.item_id).collect();
        let after_items: Vec<i32> = after.recommendations.iter().map(|r| r.item_id).collect();
        assert_eq!(before_items, after_items);
    }
}

#[test]
fn test_report_has_one_line_per_user() {
    let rows = clamped_rows();
    let lines = format_report(&rows);

    assert_eq!(lines.len(), TARGET_USERS.len());
    for (line, user) in lines.iter().zip(TARGET_USERS) {
        assert!(line.starts_with(&format!("User {user}: ")));
        assert!(line.matches("(Item: ").count() <= 5);
    }

    // Strong user saturates at the top of the scale
    assert!(format_user_line(&rows[0]).contains("Rating: 5.0000"));
    // Negative user is pinned to the bottom
    assert!(lines[2].ends_with("Rating: 1.0000)"));
}
