/// Review aggregate for a single product
///
/// Holds the ordered review list together with the statistics derived from it.
/// Construction outside this module goes through `from_reviews`, which derives
/// the statistics, so a value built in-process is consistent by construction.
/// Values read back from a store keep whatever was persisted and may be checked
/// with `services::invariants::verify`.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::reviews::domain::{
    entities::Review, services::invariants::derive_statistics, value_objects::StarCounts,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAggregate {
    reviews: Vec<Review>,
    star_counts: StarCounts,
    average_rating: f64,
}

impl ReviewAggregate {
    pub fn empty() -> Self {
        Self {
            reviews: Vec::new(),
            star_counts: StarCounts::default(),
            average_rating: 0.0,
        }
    }

    /// Derives star buckets, the average and every review's reaction counters.
    pub(crate) fn from_reviews(mut reviews: Vec<Review>) -> Self {
        for review in reviews.iter_mut() {
            review.recount_reactions();
        }
        let (star_counts, average_rating) = derive_statistics(&reviews);
        Self {
            reviews,
            star_counts,
            average_rating,
        }
    }

    /// Rehydrate persisted parts verbatim, without re-deriving anything.
    pub(crate) fn from_stored_parts(
        reviews: Vec<Review>,
        star_counts: StarCounts,
        average_rating: f64,
    ) -> Self {
        Self {
            reviews,
            star_counts,
            average_rating,
        }
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn star_counts(&self) -> StarCounts {
        self.star_counts
    }

    pub fn average_rating(&self) -> f64 {
        self.average_rating
    }

    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn find_review(&self, review_id: &Uuid) -> Option<&Review> {
        self.reviews.iter().find(|review| review.id() == *review_id)
    }

    pub fn review_by_author(&self, author_id: &Uuid) -> Option<&Review> {
        self.reviews
            .iter()
            .find(|review| review.author_id() == *author_id)
    }
}

impl Default for ReviewAggregate {
    fn default() -> Self {
        Self::empty()
    }
}

/// Aggregate as held by a store, tagged with the version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAggregate {
    pub product_id: Uuid,
    pub version: i64,
    pub aggregate: ReviewAggregate,
}

/// Read model for rating leaderboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRating {
    pub product_id: Uuid,
    pub average_rating: f64,
    pub review_count: usize,
}

impl ProductRating {
    pub fn from_stored(stored: &StoredAggregate) -> Self {
        Self {
            product_id: stored.product_id,
            average_rating: stored.aggregate.average_rating(),
            review_count: stored.aggregate.review_count(),
        }
    }

    /// Highest average first, then most reviews, then product id for a stable order.
    pub fn leaderboard_order(a: &ProductRating, b: &ProductRating) -> std::cmp::Ordering {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then_with(|| b.review_count.cmp(&a.review_count))
            .then_with(|| a.product_id.cmp(&b.product_id))
    }
}
