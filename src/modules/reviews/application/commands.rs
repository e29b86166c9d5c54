use uuid::Uuid;

use crate::modules::reviews::domain::{Polarity, Rating, ReviewAuthor};
use crate::shared::errors::AppResult;

/// Command for adding a review to a product
#[derive(Debug, Clone)]
pub struct AddReviewCommand {
    pub product_id: Uuid,
    pub author: ReviewAuthor,
    pub rating: Rating,
    pub comment: String,
}

impl AddReviewCommand {
    /// Validates the raw rating coming off the wire.
    pub fn new(
        product_id: Uuid,
        author: ReviewAuthor,
        rating: i64,
        comment: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            product_id,
            author,
            rating: Rating::new(rating)?,
            comment: comment.into(),
        })
    }
}

/// Command for deleting a review
#[derive(Debug, Clone, Copy)]
pub struct RemoveReviewCommand {
    pub product_id: Uuid,
    pub review_id: Uuid,
}

impl RemoveReviewCommand {
    pub fn new(product_id: Uuid, review_id: Uuid) -> Self {
        Self {
            product_id,
            review_id,
        }
    }
}

/// Command for agreeing or disagreeing with a review
#[derive(Debug, Clone, Copy)]
pub struct ReactCommand {
    pub product_id: Uuid,
    pub review_id: Uuid,
    pub user_id: Uuid,
    pub polarity: Polarity,
}

impl ReactCommand {
    pub fn new(product_id: Uuid, review_id: Uuid, user_id: Uuid, polarity: Polarity) -> Self {
        Self {
            product_id,
            review_id,
            user_id,
            polarity,
        }
    }
}
