/// Test data factories using builder pattern
///
/// Provides convenient methods to create ledger commands with sensible defaults
use std::sync::Arc;

use storefront_lib::modules::reviews::{
    AddReviewCommand, InMemoryProductStore, ProductStore, RetryPolicy, ReviewAuthor,
    ReviewLedger,
};
use uuid::Uuid;

pub struct ReviewFactory {
    product_id: Uuid,
    author_id: Uuid,
    display_name: String,
    rating: i64,
    comment: String,
}

impl ReviewFactory {
    pub fn for_product(product_id: Uuid) -> Self {
        Self {
            product_id,
            author_id: Uuid::new_v4(),
            display_name: "Test Reviewer".to_string(),
            rating: 3,
            comment: "Works as advertised".to_string(),
        }
    }

    pub fn by(mut self, author_id: Uuid) -> Self {
        self.author_id = author_id;
        self
    }

    pub fn named(mut self, display_name: &str) -> Self {
        self.display_name = display_name.to_string();
        self
    }

    pub fn rating(mut self, rating: i64) -> Self {
        self.rating = rating;
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    pub fn build(self) -> AddReviewCommand {
        AddReviewCommand::new(
            self.product_id,
            ReviewAuthor::new(self.author_id, self.display_name),
            self.rating,
            self.comment,
        )
        .expect("factory rating must be within 1..=5")
    }
}

/// A ledger over a fresh in-memory store, with retries that do not sleep long
pub fn memory_ledger() -> (Arc<InMemoryProductStore>, ReviewLedger) {
    let store = Arc::new(InMemoryProductStore::new());
    let ledger = ReviewLedger::new(Arc::clone(&store) as Arc<dyn ProductStore>)
        .with_retry_policy(fast_retries());
    (store, ledger)
}

pub fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        max_retries: 5,
        base_delay: std::time::Duration::from_millis(1),
        max_delay: std::time::Duration::from_millis(5),
        jitter: false,
        ..RetryPolicy::default()
    }
}
