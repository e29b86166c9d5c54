//! Consistency rules tying a product's review list to its derived statistics.
//!
//! `derive_statistics` is the single place star counts and the average are
//! computed. `check` reports every rule a given aggregate breaks.

use std::collections::HashSet;

use uuid::Uuid;

use crate::modules::reviews::domain::{
    aggregates::ReviewAggregate,
    entities::Review,
    value_objects::{Rating, StarCounts},
};
use crate::shared::errors::{AppError, AppResult};

const AVERAGE_TOLERANCE: f64 = 1e-9;

/// Star buckets and mean rating for a review list. The mean of no reviews is 0.
pub fn derive_statistics(reviews: &[Review]) -> (StarCounts, f64) {
    let star_counts = StarCounts::tally(reviews.iter().map(Review::rating));

    let average = if reviews.is_empty() {
        0.0
    } else {
        let sum: u64 = reviews
            .iter()
            .map(|review| u64::from(review.rating().value()))
            .sum();
        sum as f64 / reviews.len() as f64
    };

    (star_counts, average)
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    BucketTotalMismatch { bucket_total: u64, review_count: usize },
    BucketMismatch { rating: u8, stored: u32, actual: u32 },
    AverageMismatch { stored: f64, actual: f64 },
    DuplicateAuthor { author_id: Uuid },
    DuplicateReviewId { review_id: Uuid },
    ReactionCountMismatch { review_id: Uuid },
    DuplicateReaction { review_id: Uuid, user_id: Uuid },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantViolation::BucketTotalMismatch {
                bucket_total,
                review_count,
            } => write!(
                f,
                "star buckets sum to {} but there are {} reviews",
                bucket_total, review_count
            ),
            InvariantViolation::BucketMismatch {
                rating,
                stored,
                actual,
            } => write!(
                f,
                "{}-star bucket holds {} but {} reviews have that rating",
                rating, stored, actual
            ),
            InvariantViolation::AverageMismatch { stored, actual } => {
                write!(f, "average rating {} should be {}", stored, actual)
            }
            InvariantViolation::DuplicateAuthor { author_id } => {
                write!(f, "author {} has more than one review", author_id)
            }
            InvariantViolation::DuplicateReviewId { review_id } => {
                write!(f, "review id {} appears more than once", review_id)
            }
            InvariantViolation::ReactionCountMismatch { review_id } => write!(
                f,
                "reaction counters on review {} disagree with its reactions",
                review_id
            ),
            InvariantViolation::DuplicateReaction { review_id, user_id } => write!(
                f,
                "user {} reacted more than once to review {}",
                user_id, review_id
            ),
        }
    }
}

pub fn check(aggregate: &ReviewAggregate) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let reviews = aggregate.reviews();
    let stored_counts = aggregate.star_counts();
    let (actual_counts, actual_average) = derive_statistics(reviews);

    if stored_counts.total() != reviews.len() as u64 {
        violations.push(InvariantViolation::BucketTotalMismatch {
            bucket_total: stored_counts.total(),
            review_count: reviews.len(),
        });
    }

    for rating in Rating::ALL {
        let (stored, actual) = (stored_counts.get(rating), actual_counts.get(rating));
        if stored != actual {
            violations.push(InvariantViolation::BucketMismatch {
                rating: rating.value(),
                stored,
                actual,
            });
        }
    }

    let stored_average = aggregate.average_rating();
    if !stored_average.is_finite() || (stored_average - actual_average).abs() > AVERAGE_TOLERANCE
    {
        violations.push(InvariantViolation::AverageMismatch {
            stored: stored_average,
            actual: actual_average,
        });
    }

    let mut authors = HashSet::new();
    let mut ids = HashSet::new();
    for review in reviews {
        if !authors.insert(review.author_id()) {
            violations.push(InvariantViolation::DuplicateAuthor {
                author_id: review.author_id(),
            });
        }
        if !ids.insert(review.id()) {
            violations.push(InvariantViolation::DuplicateReviewId {
                review_id: review.id(),
            });
        }

        if review.live_reaction_counts() != (review.agree_count(), review.disagree_count()) {
            violations.push(InvariantViolation::ReactionCountMismatch {
                review_id: review.id(),
            });
        }

        let mut reactors = HashSet::new();
        for reaction in review.reactions() {
            if !reactors.insert(reaction.user_id) {
                violations.push(InvariantViolation::DuplicateReaction {
                    review_id: review.id(),
                    user_id: reaction.user_id,
                });
            }
        }
    }

    violations
}

pub fn is_consistent(aggregate: &ReviewAggregate) -> bool {
    check(aggregate).is_empty()
}

/// Post-condition gate for freshly computed aggregates.
pub fn verify(aggregate: &ReviewAggregate) -> AppResult<()> {
    let violations = check(aggregate);
    if violations.is_empty() {
        return Ok(());
    }

    let detail = violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(AppError::InvariantViolation(detail))
}
