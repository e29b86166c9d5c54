/// Repository trait for per-product review aggregates
///
/// One record per product, read and written whole. Writes are conditional on
/// the version the caller read; a mismatch is reported as `AppError::Conflict`.
use crate::modules::reviews::domain::aggregates::{ProductRating, ReviewAggregate, StoredAggregate};
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Create an empty aggregate at version 0 for a new product
    async fn create(&self, product_id: Uuid) -> AppResult<StoredAggregate>;

    /// Load the aggregate and the version it is stored at (`NotFound` if absent)
    async fn load(&self, product_id: Uuid) -> AppResult<StoredAggregate>;

    /// Replace the aggregate if it is still at `expected_version`; returns the new version
    async fn save(
        &self,
        product_id: Uuid,
        aggregate: &ReviewAggregate,
        expected_version: i64,
    ) -> AppResult<i64>;

    /// Remove the aggregate along with its product
    async fn delete(&self, product_id: Uuid) -> AppResult<()>;

    /// Every product id with a stored aggregate (startup sweeps)
    async fn product_ids(&self) -> AppResult<Vec<Uuid>>;

    /// Products ordered by `ProductRating::leaderboard_order`
    async fn top_rated(&self, limit: usize) -> AppResult<Vec<ProductRating>>;
}
