/// Product review ledger
///
/// Keeps each product's reviews, star buckets, average rating and per-review
/// agree/disagree tallies consistent with one another.
///
/// Architecture:
/// - Domain: value objects, the review aggregate, invariant checks, pure
///   transition rules and the `ProductStore` trait
/// - Application: `ReviewLedger`, which runs each transition as a locked,
///   version-checked read-modify-write
/// - Infrastructure: PostgreSQL (diesel) and in-memory stores
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-exports for easy external access
pub use application::{
    AddReviewCommand, ReactCommand, RemoveReviewCommand, RepairOutcome, RepairSummary,
    RetryPolicy, ReviewLedger, UserReaction,
};
pub use domain::{
    Polarity, ProductRating, ProductStore, Rating, Reaction, Review, ReviewAggregate,
    ReviewAuthor, StarCounts, StoredAggregate,
};
pub use infrastructure::{InMemoryProductStore, PgProductStore};
