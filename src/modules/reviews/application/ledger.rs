use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::{
    commands::{AddReviewCommand, ReactCommand, RemoveReviewCommand},
    product_locks::ProductLocks,
    retry_policy::RetryPolicy,
};
use crate::modules::reviews::domain::{
    services::{invariants, ledger_rules, InvariantViolation},
    Polarity, ProductRating, ProductStore, Review, ReviewAggregate,
};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{LogContext, TimedOperation, Validator};
use crate::{log_debug, log_error, log_warn};

/// Result of rebuilding one product's derived statistics
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub product_id: Uuid,
    /// True when the stored aggregate differed from the rebuilt one and was rewritten
    pub repaired: bool,
    /// What was wrong with the stored aggregate before the rebuild
    pub violations: Vec<InvariantViolation>,
    pub aggregate: ReviewAggregate,
}

#[derive(Debug, Clone)]
pub struct RepairFailure {
    pub product_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct RepairSummary {
    pub checked: usize,
    pub repaired: usize,
    pub failed: Vec<RepairFailure>,
}

/// A user's reaction as seen from the user's side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReaction {
    pub review_id: Uuid,
    pub polarity: Polarity,
}

/// Operations that mutate a product's reviews.
///
/// Every mutation runs as one unit per product: take the product lock, load,
/// compute the next aggregate with the pure rules, verify it, then write it
/// back conditionally on the version that was loaded. A version conflict
/// restarts the cycle under `RetryPolicy`; any other error is returned as-is
/// and nothing is written.
pub struct ReviewLedger {
    store: Arc<dyn ProductStore>,
    locks: ProductLocks,
    retry_policy: RetryPolicy,
}

impl ReviewLedger {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self {
            store,
            locks: ProductLocks::new(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    // ============================================================================================
    // COMMANDS
    // ============================================================================================

    /// Start an empty review aggregate for a newly created product
    pub async fn register_product(&self, product_id: Uuid) -> AppResult<ReviewAggregate> {
        let guard = self.locks.acquire(product_id).await;
        let created = self.store.create(product_id).await;
        drop(guard);
        self.locks.release(product_id);

        let stored = created?;
        log_debug!("Registered review aggregate for product {}", product_id);
        Ok(stored.aggregate)
    }

    /// Remove the aggregate together with its product
    pub async fn drop_product(&self, product_id: Uuid) -> AppResult<()> {
        let guard = self.locks.acquire(product_id).await;
        let deleted = self.store.delete(product_id).await;
        drop(guard);
        self.locks.release(product_id);

        deleted?;
        log_debug!("Dropped review aggregate for product {}", product_id);
        Ok(())
    }

    pub async fn add_review(&self, command: AddReviewCommand) -> AppResult<Review> {
        let AddReviewCommand {
            product_id,
            author,
            rating,
            comment,
        } = command;

        self.commit(product_id, "add_review", |current| {
            ledger_rules::apply_add(&product_id, current, author.clone(), rating, comment.clone())
        })
        .await
    }

    /// Returns the review that was removed
    pub async fn remove_review(&self, command: RemoveReviewCommand) -> AppResult<Review> {
        let RemoveReviewCommand {
            product_id,
            review_id,
        } = command;

        self.commit(product_id, "remove_review", |current| {
            ledger_rules::apply_remove(&product_id, current, &review_id)
        })
        .await
    }

    /// Returns the review with its updated reaction set
    pub async fn react(&self, command: ReactCommand) -> AppResult<Review> {
        let ReactCommand {
            product_id,
            review_id,
            user_id,
            polarity,
        } = command;

        self.commit(product_id, "react", |current| {
            ledger_rules::apply_reaction(&product_id, current, &review_id, user_id, polarity)
        })
        .await
    }

    /// Rebuild star counts, average and reaction counters from the review list.
    /// Writes only when the rebuilt aggregate differs from the stored one.
    pub async fn recompute_aggregate(&self, product_id: Uuid) -> AppResult<RepairOutcome> {
        let (repaired, violations, aggregate) = self
            .commit(product_id, "recompute_aggregate", |current| {
                let violations = invariants::check(current);
                let (rebuilt, changed) = ledger_rules::rebuild(current);
                Ok((rebuilt.clone(), (changed, violations, rebuilt)))
            })
            .await?;

        if repaired {
            log_warn!(
                "Repaired review aggregate for product {}: {}",
                product_id,
                violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        }

        Ok(RepairOutcome {
            product_id,
            repaired,
            violations,
            aggregate,
        })
    }

    /// Run `recompute_aggregate` over every stored product
    pub async fn recompute_all(&self) -> AppResult<RepairSummary> {
        let timer = TimedOperation::new("recompute_all");
        let product_ids = self.store.product_ids().await?;
        let mut summary = RepairSummary::default();

        for product_id in product_ids {
            match self.recompute_aggregate(product_id).await {
                Ok(outcome) => {
                    summary.checked += 1;
                    if outcome.repaired {
                        summary.repaired += 1;
                    }
                }
                // Deleted between listing and loading
                Err(AppError::NotFound(_)) => {}
                Err(err) => {
                    LogContext::error_with_context(
                        &err,
                        &format!("Consistency check failed for product {}", product_id),
                    );
                    summary.checked += 1;
                    summary.failed.push(RepairFailure {
                        product_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        timer.finish_with_info(&format!(
            "{} checked, {} repaired, {} failed",
            summary.checked,
            summary.repaired,
            summary.failed.len()
        ));
        Ok(summary)
    }

    // ============================================================================================
    // QUERIES
    // ============================================================================================

    pub async fn aggregate(&self, product_id: Uuid) -> AppResult<ReviewAggregate> {
        Ok(self.store.load(product_id).await?.aggregate)
    }

    pub async fn reaction_of(
        &self,
        product_id: Uuid,
        review_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Polarity>> {
        let stored = self.store.load(product_id).await?;
        let review = stored
            .aggregate
            .find_review(&review_id)
            .ok_or_else(|| AppError::review_not_found(&product_id, &review_id))?;

        Ok(review.reaction_of(&user_id))
    }

    /// Every reaction `user_id` has left on this product's reviews, in review order
    pub async fn user_reactions(
        &self,
        product_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<UserReaction>> {
        let stored = self.store.load(product_id).await?;

        Ok(stored
            .aggregate
            .reviews()
            .iter()
            .filter_map(|review| {
                review.reaction_of(&user_id).map(|polarity| UserReaction {
                    review_id: review.id(),
                    polarity,
                })
            })
            .collect())
    }

    /// Best-rated products first; `None` means the default leaderboard size
    pub async fn top_rated(&self, limit: Option<usize>) -> AppResult<Vec<ProductRating>> {
        let limit = limit.unwrap_or(Validator::DEFAULT_TOP_RATED_LIMIT);
        Validator::validate_top_rated_limit(limit)?;
        self.store.top_rated(limit).await
    }

    // ============================================================================================
    // READ-MODIFY-WRITE
    // ============================================================================================

    async fn commit<T, F>(
        &self,
        product_id: Uuid,
        operation: &'static str,
        transition: F,
    ) -> AppResult<T>
    where
        F: FnMut(&ReviewAggregate) -> AppResult<(ReviewAggregate, T)> + Send,
        T: Send,
    {
        let guard = self.locks.acquire(product_id).await;
        let result = self.commit_locked(product_id, operation, transition).await;
        drop(guard);
        self.locks.release(product_id);
        result
    }

    /// Load, transition, verify and save, retrying on version conflicts.
    /// Caller holds the product lock.
    async fn commit_locked<T, F>(
        &self,
        product_id: Uuid,
        operation: &'static str,
        mut transition: F,
    ) -> AppResult<T>
    where
        F: FnMut(&ReviewAggregate) -> AppResult<(ReviewAggregate, T)> + Send,
        T: Send,
    {
        let max_attempts = self.retry_policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let stored = self.store.load(product_id).await?;
            let (next, output) = transition(&stored.aggregate)?;

            if let Err(err) = invariants::verify(&next) {
                log_error!(
                    "{} on product {} produced an inconsistent aggregate: {}",
                    operation,
                    product_id,
                    err
                );
                return Err(err);
            }

            if next == stored.aggregate {
                log_debug!("{} on product {} changed nothing", operation, product_id);
                return Ok(output);
            }

            match self.store.save(product_id, &next, stored.version).await {
                Ok(version) => {
                    LogContext::ledger_commit(operation, &product_id, version, attempt);
                    return Ok(output);
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry_policy.calculate_delay(attempt - 1);
                    log_warn!(
                        "{} on product {} hit a write conflict (attempt {}/{}), retrying in {:?}",
                        operation,
                        product_id,
                        attempt,
                        max_attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
