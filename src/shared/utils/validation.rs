use crate::shared::errors::AppError;

pub struct Validator;

impl Validator {
    pub const MIN_RATING: i64 = 1;
    pub const MAX_RATING: i64 = 5;
    pub const DEFAULT_TOP_RATED_LIMIT: usize = 3;
    pub const MAX_TOP_RATED_LIMIT: usize = 100;

    pub fn validate_rating(rating: i64) -> Result<(), AppError> {
        if !(Self::MIN_RATING..=Self::MAX_RATING).contains(&rating) {
            return Err(AppError::ValidationError(format!(
                "Rating must be between {} and {}, got {}",
                Self::MIN_RATING,
                Self::MAX_RATING,
                rating
            )));
        }
        Ok(())
    }

    pub fn validate_top_rated_limit(limit: usize) -> Result<(), AppError> {
        if limit == 0 {
            return Err(AppError::ValidationError(
                "Limit must be positive".to_string(),
            ));
        }
        if limit > Self::MAX_TOP_RATED_LIMIT {
            return Err(AppError::ValidationError(format!(
                "Limit cannot exceed {}",
                Self::MAX_TOP_RATED_LIMIT
            )));
        }
        Ok(())
    }
}
