use serde::{Deserialize, Serialize};

/// Direction of a user's reaction to a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Agree,
    Disagree,
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Agree => write!(f, "agree"),
            Polarity::Disagree => write!(f, "disagree"),
        }
    }
}
