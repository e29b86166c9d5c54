pub mod review_aggregate;

pub use review_aggregate::{ProductRating, ReviewAggregate, StoredAggregate};
