//! # Recommender Crate
//!
//! Top-N item recommendation from a loaded ALS model.
//!
//! ## Components
//!
//! - **types**: `UserTable` (the request), `Recommendation` and
//!   `UserRecommendations` (the result), text table rendering
//! - **top_n**: `TopNRecommender`, dot-product scoring with bounded-heap
//!   selection, parallel across users
//!
//! ## Example Usage
//!
//! ```ignore
//! use model_loader::AlsModel;
//! use recommender::{TopNRecommender, UserTable};
//! use std::sync::Arc;
//!
//! let model = Arc::new(AlsModel::load("als_model_hashing")?);
//! let users = UserTable::new(model.user_col(), [1698346, 3511597]);
//!
//! let recommender = TopNRecommender::new(model.clone());
//! let rows = recommender.recommend_for_user_subset(&users, 5)?;
//! ```

pub mod error;
pub mod types;
pub mod top_n;

pub use error::{RecommendError, Result};
pub use top_n::TopNRecommender;
pub use types::{Recommendation, RecommendationTable, UserRecommendations, UserTable};
