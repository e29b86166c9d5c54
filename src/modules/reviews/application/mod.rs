pub mod commands;
pub mod ledger;
pub mod product_locks;
pub mod retry_policy;

pub use commands::{AddReviewCommand, ReactCommand, RemoveReviewCommand};
pub use ledger::{RepairFailure, RepairOutcome, RepairSummary, ReviewLedger, UserReaction};
pub use product_locks::ProductLocks;
pub use retry_policy::RetryPolicy;
