pub mod review;

pub use review::{Reaction, Review, ReviewAuthor};
