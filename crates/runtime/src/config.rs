//! Job configuration.
//!
//! Every setting has a compiled-in default; the binary may override them
//! from the command line.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory the training run wrote its results to
pub const PREVIOUS_OUTPUT_DIR: &str = "./spark_recommender_results_hashing";
/// Saved model, relative to [`PREVIOUS_OUTPUT_DIR`]
pub const MODEL_DIR_NAME: &str = "als_model_hashing";
/// Output directory for this job's log
pub const OUTPUT_DIR: &str = "./spark_recommendation_generation";
/// Log file name inside [`OUTPUT_DIR`]
pub const LOG_FILE_NAME: &str = "generate_recommendations.log";

pub const APP_NAME: &str = "ALSRecommendFromSaved";
pub const MASTER: &str = "local[*]";
pub const DRIVER_MEMORY: &str = "4g";
pub const EXECUTOR_MEMORY: &str = "4g";
pub const SERIALIZER_BUFFER_MAX: &str = "512m";

/// Column the saved model was trained on
pub const USER_COL: &str = "userIdInt";

/// Hashed user ids from the previous run's output
pub const USER_IDS_TO_RECOMMEND: [i32; 3] = [1698346, 3511597, 4902608];
pub const NUM_RECOMMENDATIONS: usize = 5;

/// Everything one run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub app_name: String,
    pub master: String,
    pub model_path: PathBuf,
    pub output_dir: PathBuf,
    pub log_file: PathBuf,
    pub driver_memory: String,
    pub executor_memory: String,
    pub serializer_buffer_max: String,
    pub user_col: String,
    pub user_ids: Vec<i32>,
    pub num_recommendations: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        let output_dir = PathBuf::from(OUTPUT_DIR);
        Self {
            app_name: APP_NAME.to_string(),
            master: MASTER.to_string(),
            model_path: PathBuf::from(PREVIOUS_OUTPUT_DIR).join(MODEL_DIR_NAME),
            log_file: output_dir.join(LOG_FILE_NAME),
            output_dir,
            driver_memory: DRIVER_MEMORY.to_string(),
            executor_memory: EXECUTOR_MEMORY.to_string(),
            serializer_buffer_max: SERIALIZER_BUFFER_MAX.to_string(),
            user_col: USER_COL.to_string(),
            user_ids: USER_IDS_TO_RECOMMEND.to_vec(),
            num_recommendations: NUM_RECOMMENDATIONS,
        }
    }
}
