pub mod aggregates;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod value_objects;

// Re-exports for easy access
pub use aggregates::{ProductRating, ReviewAggregate, StoredAggregate};
pub use entities::{Reaction, Review, ReviewAuthor};
pub use repositories::ProductStore;
pub use value_objects::{Polarity, Rating, StarCounts};
