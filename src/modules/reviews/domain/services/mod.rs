pub mod invariants;
pub mod ledger_rules;

pub use invariants::{derive_statistics, InvariantViolation};
