//! Pure state transitions for a product's reviews.
//!
//! Each rule takes the current aggregate by reference and returns a brand new
//! one built through `ReviewAggregate::from_reviews`, so statistics are always
//! re-derived from the full review list instead of being patched in place.
//! On error the caller's aggregate is untouched.

use uuid::Uuid;

use crate::modules::reviews::domain::{
    aggregates::ReviewAggregate,
    entities::{Review, ReviewAuthor},
    value_objects::{Polarity, Rating},
};
use crate::shared::errors::{AppError, AppResult};

/// Appends a new review by `author`. One review per author per product.
pub fn apply_add(
    product_id: &Uuid,
    current: &ReviewAggregate,
    author: ReviewAuthor,
    rating: Rating,
    comment: String,
) -> AppResult<(ReviewAggregate, Review)> {
    if current.review_by_author(&author.id).is_some() {
        return Err(AppError::DuplicateReview {
            product_id: *product_id,
            author_id: author.id,
        });
    }

    let review = Review::new(author, rating, comment);
    let mut reviews = current.reviews().to_vec();
    reviews.push(review.clone());

    Ok((ReviewAggregate::from_reviews(reviews), review))
}

/// Drops the review with `review_id`, returning it alongside the new aggregate.
pub fn apply_remove(
    product_id: &Uuid,
    current: &ReviewAggregate,
    review_id: &Uuid,
) -> AppResult<(ReviewAggregate, Review)> {
    let position = current
        .reviews()
        .iter()
        .position(|review| review.id() == *review_id)
        .ok_or_else(|| AppError::review_not_found(product_id, review_id))?;

    let mut reviews = current.reviews().to_vec();
    let removed = reviews.remove(position);

    Ok((ReviewAggregate::from_reviews(reviews), removed))
}

/// Records a terminal agree/disagree reaction. A user gets one reaction per review,
/// whichever polarity they picked first.
pub fn apply_reaction(
    product_id: &Uuid,
    current: &ReviewAggregate,
    review_id: &Uuid,
    user_id: Uuid,
    polarity: Polarity,
) -> AppResult<(ReviewAggregate, Review)> {
    let position = current
        .reviews()
        .iter()
        .position(|review| review.id() == *review_id)
        .ok_or_else(|| AppError::review_not_found(product_id, review_id))?;

    if current.reviews()[position].reaction_of(&user_id).is_some() {
        return Err(AppError::AlreadyReacted {
            review_id: *review_id,
            user_id,
        });
    }

    let mut reviews = current.reviews().to_vec();
    reviews[position].record_reaction(user_id, polarity);
    let updated = reviews[position].clone();

    Ok((ReviewAggregate::from_reviews(reviews), updated))
}

/// Rebuilds every derived value from the review list: star buckets, the average,
/// and each review's reaction counters. The flag is true when anything differed.
pub fn rebuild(current: &ReviewAggregate) -> (ReviewAggregate, bool) {
    let rebuilt = ReviewAggregate::from_reviews(current.reviews().to_vec());
    let changed = rebuilt != *current;
    (rebuilt, changed)
}
