use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::reviews::domain::value_objects::{Polarity, Rating};

/// Already-authenticated identity of a review author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAuthor {
    pub id: Uuid,
    pub display_name: String,
}

impl ReviewAuthor {
    pub fn new(id: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// One user's agree/disagree vote on a review. Write-once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub user_id: Uuid,
    pub polarity: Polarity,
    pub reacted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    id: Uuid,
    author_id: Uuid,
    author_display_name: String,
    rating: Rating,
    comment: String,
    #[serde(default)]
    reactions: Vec<Reaction>,
    #[serde(default)]
    agree_count: u32,
    #[serde(default)]
    disagree_count: u32,
    created_at: DateTime<Utc>,
}

impl Review {
    pub(crate) fn new(author: ReviewAuthor, rating: Rating, comment: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id: author.id,
            author_display_name: author.display_name,
            rating,
            comment,
            reactions: Vec::new(),
            agree_count: 0,
            disagree_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn author_id(&self) -> Uuid {
        self.author_id
    }

    pub fn author_display_name(&self) -> &str {
        &self.author_display_name
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn agree_count(&self) -> u32 {
        self.agree_count
    }

    pub fn disagree_count(&self) -> u32 {
        self.disagree_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn reaction_of(&self, user_id: &Uuid) -> Option<Polarity> {
        self.reactions
            .iter()
            .find(|reaction| reaction.user_id == *user_id)
            .map(|reaction| reaction.polarity)
    }

    /// Counts taken from the reaction set itself, ignoring the stored counters.
    pub fn live_reaction_counts(&self) -> (u32, u32) {
        self.reactions
            .iter()
            .fold((0, 0), |(agree, disagree), reaction| match reaction.polarity {
                Polarity::Agree => (agree + 1, disagree),
                Polarity::Disagree => (agree, disagree + 1),
            })
    }

    /// Appends the reaction and bumps the matching counter together.
    /// Callers must have checked `reaction_of` first.
    pub(crate) fn record_reaction(&mut self, user_id: Uuid, polarity: Polarity) {
        self.reactions.push(Reaction {
            user_id,
            polarity,
            reacted_at: Utc::now(),
        });
        match polarity {
            Polarity::Agree => self.agree_count += 1,
            Polarity::Disagree => self.disagree_count += 1,
        }
    }

    /// Re-derives both counters from the reaction set. Returns true if either changed.
    pub(crate) fn recount_reactions(&mut self) -> bool {
        let (agree, disagree) = self.live_reaction_counts();
        let changed = agree != self.agree_count || disagree != self.disagree_count;
        self.agree_count = agree;
        self.disagree_count = disagree;
        changed
    }
}
