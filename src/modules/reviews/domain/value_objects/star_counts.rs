use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::rating::Rating;

/// Per-rating review counters ("star buckets").
///
/// Serialized as a map from rating to count that omits empty buckets, so an
/// aggregate without reviews stores `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<u8, u32>", into = "BTreeMap<u8, u32>")]
pub struct StarCounts([u32; 5]);

impl StarCounts {
    pub fn get(&self, rating: Rating) -> u32 {
        self.0[rating.bucket()]
    }

    /// Sum over all buckets; equals the number of reviews it describes.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|&count| u64::from(count)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Non-empty buckets in ascending rating order.
    pub fn iter(&self) -> impl Iterator<Item = (Rating, u32)> + '_ {
        Rating::ALL
            .into_iter()
            .map(|rating| (rating, self.get(rating)))
            .filter(|(_, count)| *count > 0)
    }

    pub(crate) fn tally<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = Rating>,
    {
        let mut buckets = [0u32; 5];
        for rating in ratings {
            buckets[rating.bucket()] += 1;
        }
        Self(buckets)
    }
}

impl TryFrom<BTreeMap<u8, u32>> for StarCounts {
    type Error = String;

    fn try_from(map: BTreeMap<u8, u32>) -> Result<Self, Self::Error> {
        let mut buckets = [0u32; 5];
        for (star, count) in map {
            let rating = Rating::try_from(star)
                .map_err(|_| format!("Invalid star bucket key: {}", star))?;
            buckets[rating.bucket()] = count;
        }
        Ok(Self(buckets))
    }
}

impl From<StarCounts> for BTreeMap<u8, u32> {
    fn from(counts: StarCounts) -> Self {
        counts
            .iter()
            .map(|(rating, count)| (rating.value(), count))
            .collect()
    }
}
