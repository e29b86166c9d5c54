/// Diesel-based implementation of ProductStore
///
/// One `product_reviews` row per product with the review list in a JSONB column.
/// Saves are conditional updates on the `version` column, so two writers that
/// read the same version cannot both commit.
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use tokio::task;
use tracing::debug;
use uuid::Uuid;

use super::models::{NewProductReviews, ProductReviewsChangeset, ProductReviewsModel};
use crate::modules::reviews::domain::{
    ProductRating, ProductStore, ReviewAggregate, StoredAggregate,
};
use crate::schema::product_reviews;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::infrastructure::Database;
use crate::shared::utils::LogContext;

pub struct PgProductStore {
    db: Arc<Database>,
}

impl PgProductStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn create(&self, product_id: Uuid) -> AppResult<StoredAggregate> {
        let db = Arc::clone(&self.db);
        let new_row = NewProductReviews::empty(product_id)?;

        let model = task::spawn_blocking(move || -> AppResult<ProductReviewsModel> {
            let mut conn = db.get_connection()?;
            diesel::insert_into(product_reviews::table)
                .values(&new_row)
                .returning(ProductReviewsModel::as_returning())
                .get_result(&mut conn)
                .map_err(|e| match e {
                    diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        AppError::ValidationError(format!(
                            "Product {} already has a review aggregate",
                            product_id
                        ))
                    }
                    other => AppError::from(other),
                })
        })
        .await??;

        debug!(%product_id, "created empty review aggregate");
        model.to_stored_aggregate()
    }

    async fn load(&self, product_id: Uuid) -> AppResult<StoredAggregate> {
        let db = Arc::clone(&self.db);
        let start = Instant::now();

        let model = task::spawn_blocking(move || -> AppResult<Option<ProductReviewsModel>> {
            let mut conn = db.get_connection()?;
            let m = product_reviews::table
                .filter(product_reviews::product_id.eq(product_id))
                .select(ProductReviewsModel::as_select())
                .first(&mut conn)
                .optional()?;
            Ok(m)
        })
        .await??;

        LogContext::db_operation(
            "load",
            "product_reviews",
            Some(start.elapsed().as_millis() as u64),
        );

        model
            .ok_or_else(|| AppError::product_not_found(&product_id))?
            .to_stored_aggregate()
    }

    async fn save(
        &self,
        product_id: Uuid,
        aggregate: &ReviewAggregate,
        expected_version: i64,
    ) -> AppResult<i64> {
        let db = Arc::clone(&self.db);
        let next_version = expected_version + 1;
        let changeset = ProductReviewsChangeset::from_aggregate(aggregate, next_version)?;
        let start = Instant::now();

        task::spawn_blocking(move || -> AppResult<i64> {
            let mut conn = db.get_connection()?;

            let updated = diesel::update(
                product_reviews::table
                    .filter(product_reviews::product_id.eq(product_id))
                    .filter(product_reviews::version.eq(expected_version)),
            )
            .set(&changeset)
            .execute(&mut conn)?;

            if updated == 1 {
                return Ok(next_version);
            }

            let still_there: bool = diesel::select(exists(
                product_reviews::table.filter(product_reviews::product_id.eq(product_id)),
            ))
            .get_result(&mut conn)?;

            if still_there {
                Err(AppError::Conflict(format!(
                    "Product {} is no longer at version {}",
                    product_id, expected_version
                )))
            } else {
                Err(AppError::product_not_found(&product_id))
            }
        })
        .await??;

        LogContext::db_operation(
            "save",
            "product_reviews",
            Some(start.elapsed().as_millis() as u64),
        );
        debug!(%product_id, version = next_version, "saved review aggregate");
        Ok(next_version)
    }

    async fn delete(&self, product_id: Uuid) -> AppResult<()> {
        let db = Arc::clone(&self.db);

        let deleted = task::spawn_blocking(move || -> AppResult<usize> {
            let mut conn = db.get_connection()?;
            let n = diesel::delete(
                product_reviews::table.filter(product_reviews::product_id.eq(product_id)),
            )
            .execute(&mut conn)?;
            Ok(n)
        })
        .await??;

        if deleted == 0 {
            return Err(AppError::product_not_found(&product_id));
        }
        Ok(())
    }

    async fn product_ids(&self) -> AppResult<Vec<Uuid>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> AppResult<Vec<Uuid>> {
            let mut conn = db.get_connection()?;
            let ids = product_reviews::table
                .select(product_reviews::product_id)
                .order(product_reviews::product_id.asc())
                .load::<Uuid>(&mut conn)?;
            Ok(ids)
        })
        .await?
    }

    async fn top_rated(&self, limit: usize) -> AppResult<Vec<ProductRating>> {
        let db = Arc::clone(&self.db);
        let limit = i64::try_from(limit)
            .map_err(|_| AppError::InvalidInput(format!("Limit {} is too large", limit)))?;

        let rows = task::spawn_blocking(move || -> AppResult<Vec<(Uuid, f64, i32)>> {
            let mut conn = db.get_connection()?;
            let rows = product_reviews::table
                .select((
                    product_reviews::product_id,
                    product_reviews::average_rating,
                    product_reviews::review_count,
                ))
                .order((
                    product_reviews::average_rating.desc(),
                    product_reviews::review_count.desc(),
                    product_reviews::product_id.asc(),
                ))
                .limit(limit)
                .load::<(Uuid, f64, i32)>(&mut conn)?;
            Ok(rows)
        })
        .await??;

        Ok(rows
            .into_iter()
            .map(|(product_id, average_rating, review_count)| ProductRating {
                product_id,
                average_rating,
                review_count: review_count.max(0) as usize,
            })
            .collect())
    }
}
