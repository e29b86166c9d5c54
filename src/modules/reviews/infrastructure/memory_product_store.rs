use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::modules::reviews::domain::{
    ProductRating, ProductStore, ReviewAggregate, StoredAggregate,
};
use crate::shared::errors::{AppError, AppResult};

/// Process-local `ProductStore` with the same version semantics as the
/// PostgreSQL store. Used by tests and for running without a database.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    records: DashMap<Uuid, StoredAggregate>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn create(&self, product_id: Uuid) -> AppResult<StoredAggregate> {
        match self.records.entry(product_id) {
            Entry::Occupied(_) => Err(AppError::ValidationError(format!(
                "Product {} already has a review aggregate",
                product_id
            ))),
            Entry::Vacant(slot) => {
                let stored = StoredAggregate {
                    product_id,
                    version: 0,
                    aggregate: ReviewAggregate::empty(),
                };
                slot.insert(stored.clone());
                debug!(%product_id, "created empty review aggregate");
                Ok(stored)
            }
        }
    }

    async fn load(&self, product_id: Uuid) -> AppResult<StoredAggregate> {
        self.records
            .get(&product_id)
            .map(|record| record.value().clone())
            .ok_or_else(|| AppError::product_not_found(&product_id))
    }

    async fn save(
        &self,
        product_id: Uuid,
        aggregate: &ReviewAggregate,
        expected_version: i64,
    ) -> AppResult<i64> {
        // The shard write lock makes the version check and the swap one step
        let mut record = self
            .records
            .get_mut(&product_id)
            .ok_or_else(|| AppError::product_not_found(&product_id))?;

        if record.version != expected_version {
            return Err(AppError::Conflict(format!(
                "Product {} is at version {}, expected {}",
                product_id, record.version, expected_version
            )));
        }

        record.version += 1;
        record.aggregate = aggregate.clone();
        debug!(%product_id, version = record.version, "saved review aggregate");
        Ok(record.version)
    }

    async fn delete(&self, product_id: Uuid) -> AppResult<()> {
        self.records
            .remove(&product_id)
            .map(|_| ())
            .ok_or_else(|| AppError::product_not_found(&product_id))
    }

    async fn product_ids(&self) -> AppResult<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self.records.iter().map(|record| *record.key()).collect();
        ids.sort();
        Ok(ids)
    }

    async fn top_rated(&self, limit: usize) -> AppResult<Vec<ProductRating>> {
        let mut ratings: Vec<ProductRating> = self
            .records
            .iter()
            .map(|record| ProductRating::from_stored(record.value()))
            .collect();

        ratings.sort_by(ProductRating::leaderboard_order);
        ratings.truncate(limit);
        Ok(ratings)
    }
}
