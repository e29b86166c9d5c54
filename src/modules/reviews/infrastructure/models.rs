use crate::modules::reviews::domain::{
    Review, ReviewAggregate, StarCounts, StoredAggregate,
};
use crate::schema::product_reviews;
use crate::shared::errors::AppResult;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

// For reading from database
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = product_reviews)]
#[diesel(primary_key(product_id))]
pub struct ProductReviewsModel {
    pub product_id: Uuid,
    pub reviews: JsonValue,
    pub star_counts: JsonValue,
    pub average_rating: f64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Generated by PostgreSQL from `reviews`
    pub review_count: i32,
}

// For inserting a product's empty aggregate (review_count is generated)
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = product_reviews)]
pub struct NewProductReviews {
    pub product_id: Uuid,
    pub reviews: JsonValue,
    pub star_counts: JsonValue,
    pub average_rating: f64,
    pub version: i64,
}

// For replacing the aggregate (excludes product_id, created_at and review_count)
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = product_reviews)]
pub struct ProductReviewsChangeset {
    pub reviews: JsonValue,
    pub star_counts: JsonValue,
    pub average_rating: f64,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl ProductReviewsModel {
    /// Convert to the domain aggregate, keeping stored statistics as they are
    pub fn to_stored_aggregate(self) -> AppResult<StoredAggregate> {
        let reviews: Vec<Review> = serde_json::from_value(self.reviews)?;
        let star_counts: StarCounts = serde_json::from_value(self.star_counts)?;

        Ok(StoredAggregate {
            product_id: self.product_id,
            version: self.version,
            aggregate: ReviewAggregate::from_stored_parts(
                reviews,
                star_counts,
                self.average_rating,
            ),
        })
    }
}

impl NewProductReviews {
    pub fn empty(product_id: Uuid) -> AppResult<Self> {
        let aggregate = ReviewAggregate::empty();
        Ok(Self {
            product_id,
            reviews: serde_json::to_value(aggregate.reviews())?,
            star_counts: serde_json::to_value(aggregate.star_counts())?,
            average_rating: aggregate.average_rating(),
            version: 0,
        })
    }
}

impl ProductReviewsChangeset {
    pub fn from_aggregate(aggregate: &ReviewAggregate, version: i64) -> AppResult<Self> {
        Ok(Self {
            reviews: serde_json::to_value(aggregate.reviews())?,
            star_counts: serde_json::to_value(aggregate.star_counts())?,
            average_rating: aggregate.average_rating(),
            version,
            updated_at: Utc::now(),
        })
    }
}
