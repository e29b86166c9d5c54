pub mod polarity;
pub mod rating;
pub mod star_counts;

pub use polarity::Polarity;
pub use rating::Rating;
pub use star_counts::StarCounts;
