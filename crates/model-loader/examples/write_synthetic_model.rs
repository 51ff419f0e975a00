use model_loader::{AlsModel, ModelMetadata};
use rand::Rng;
use std::path::PathBuf;
use std::time::Instant;

const RANK: usize = 10;
const NUM_ITEMS: i32 = 2_000;
const NUM_EXTRA_USERS: i32 = 500;
const TARGET_USERS: [i32; 3] = [1698346, 3511597, 4902608];

fn main() {
    let model_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("spark_recommender_results_hashing/als_model_hashing"));

    let mut metadata = ModelMetadata::new("ALS_synthetic", RANK);
    metadata.param_map.user_col = "userIdInt".to_string();
    metadata.param_map.item_col = "itemIdInt".to_string();
    metadata.param_map.cold_start_strategy = "drop".to_string();

    let mut rng = rand::rng();
    let mut random_row = || -> Vec<f32> { (0..RANK).map(|_| rng.random_range(-0.2..0.8)).collect() };

    let start = Instant::now();
    let mut model = AlsModel::new(metadata);
    for user_id in TARGET_USERS.into_iter().chain(1..=NUM_EXTRA_USERS) {
        model
            .insert_user_factors(user_id, &random_row())
            .expect("Failed to insert user factors");
    }
    for item_id in 1..=NUM_ITEMS {
        model
            .insert_item_factors(item_id, &random_row())
            .expect("Failed to insert item factors");
    }

    model.save(&model_dir).expect("Failed to save model");

    let (users, items) = model.counts();
    println!("Wrote synthetic model to {}", model_dir.display());
    println!("Users: {}, Items: {}, Rank: {}", users, items, RANK);
    println!("Time taken: {:?}", start.elapsed());
}
