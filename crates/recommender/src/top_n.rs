//! Top-N recommendation over ALS factor tables.
//!
//! ## Algorithm
//! For every requested user:
//! 1. Look up the user's factor row
//! 2. Score every item as the dot product with the item's factor row
//! 3. Keep the N best scores in a bounded min-heap
//! 4. Emit them best first (ties broken by ascending item id)
//!
//! Users are scored in parallel on the current rayon pool, so callers that
//! want a bounded worker count run the request inside their own pool.

use crate::error::{RecommendError, Result};
use crate::types::{Recommendation, UserRecommendations, UserTable};
use model_loader::{AlsModel, ItemId, UserId, dot};
use rayon::prelude::*;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Computes top-N item lists from a loaded model
#[derive(Clone)]
pub struct TopNRecommender {
    /// Shared reference to the loaded model
    model: Arc<AlsModel>,

    /// Per-task working memory budget, unlimited if `None`
    max_task_bytes: Option<u64>,
}

impl TopNRecommender {
    pub fn new(model: Arc<AlsModel>) -> Self {
        Self {
            model,
            max_task_bytes: None,
        }
    }

    /// Bound the memory one scoring task may use (default: unlimited)
    pub fn with_max_task_bytes(mut self, bytes: u64) -> Self {
        self.max_task_bytes = Some(bytes);
        self
    }

    pub fn model(&self) -> &AlsModel {
        &self.model
    }

    /// Top `n` items for each distinct user in `users`.
    ///
    /// Rows come back in first-occurrence order. Users the model has no
    /// factors for are skipped with a warning, so the result can be shorter
    /// than the table.
    #[instrument(skip(self, users), fields(users = users.len()))]
    pub fn recommend_for_user_subset(
        &self,
        users: &UserTable,
        n: usize,
    ) -> Result<Vec<UserRecommendations>> {
        if users.column() != self.model.user_col() {
            return Err(RecommendError::ColumnMismatch {
                expected: self.model.user_col().to_string(),
                found: users.column().to_string(),
            });
        }
        self.check_request(n)?;

        let mut seen = HashSet::new();
        let mut known = Vec::with_capacity(users.len());
        for &user_id in users.user_ids() {
            if !seen.insert(user_id) {
                continue;
            }
            if self.model.user_factors().contains(user_id) {
                known.push(user_id);
            } else {
                warn!("User {} has no factors in the model, skipping", user_id);
            }
        }

        let rows = self.score_users(&known, n);
        debug!("Computed recommendations for {} users", rows.len());
        Ok(rows)
    }

    /// Top `n` items for every user in the model, ordered by user id
    #[instrument(skip(self))]
    pub fn recommend_for_all_users(&self, n: usize) -> Result<Vec<UserRecommendations>> {
        self.check_request(n)?;

        let mut user_ids = self.model.user_factors().ids().to_vec();
        user_ids.sort_unstable();
        Ok(self.score_users(&user_ids, n))
    }

    fn check_request(&self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(RecommendError::InvalidCount(n));
        }
        if let Some(available) = self.max_task_bytes {
            let required = task_bytes(self.model.item_factors().len(), n);
            if required > available {
                return Err(RecommendError::TaskMemoryExceeded {
                    required,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Score users in parallel; every id must have factors
    fn score_users(&self, user_ids: &[UserId], n: usize) -> Vec<UserRecommendations> {
        user_ids
            .par_iter()
            .filter_map(|&user_id| {
                let factors = self.model.get_user_factors(user_id)?;
                Some(UserRecommendations {
                    user_id,
                    recommendations: self.top_n_for(factors, n),
                })
            })
            .collect()
    }

    fn top_n_for(&self, user_factors: &[f32], n: usize) -> Vec<Recommendation> {
        let rank = self.model.rank();
        let items = self.model.item_factors();

        let scores: Vec<f32> = (0..items.len())
            .map(|pos| dot(user_factors, items.row(pos, rank)))
            .collect();

        top_n(items.ids().iter().copied().zip(scores), n.min(items.len()))
    }
}

/// Bytes one task holds: the dense score vector plus the heap
fn task_bytes(num_items: usize, n: usize) -> u64 {
    let heap = n.min(num_items) * std::mem::size_of::<ScoredItem>();
    (num_items * std::mem::size_of::<f32>() + heap) as u64
}

/// Heap entry ordered so that "greater" means "better recommendation"
#[derive(Debug, Clone, Copy)]
struct ScoredItem {
    item_id: ItemId,
    rating: f32,
}

impl Ord for ScoredItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // NaN (from overflowing factors) ranks below every real score
        let by_rating = match (self.rating.is_nan(), other.rating.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.rating.total_cmp(&other.rating),
        };
        by_rating.then_with(|| other.item_id.cmp(&self.item_id))
    }
}

impl PartialOrd for ScoredItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScoredItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredItem {}

/// Select the `n` best (item, score) pairs, best first
///
/// The heap never reserves more than the number of candidates.
fn top_n(scored: impl Iterator<Item = (ItemId, f32)>, n: usize) -> Vec<Recommendation> {
    let (candidates, _) = scored.size_hint();
    let mut heap: BinaryHeap<Reverse<ScoredItem>> =
        BinaryHeap::with_capacity(n.min(candidates).saturating_add(1));

    for (item_id, rating) in scored {
        let candidate = ScoredItem { item_id, rating };
        if heap.len() < n {
            heap.push(Reverse(candidate));
        } else if let Some(Reverse(worst)) = heap.peek()
            && candidate > *worst
        {
            heap.pop();
            heap.push(Reverse(candidate));
        }
    }

    // Ascending by Reverse is descending by score
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(s)| Recommendation::new(s.item_id, s.rating))
        .collect()
}
