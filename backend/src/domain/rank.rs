//! Rank and percentile of one entry within its leaderboard.
//!
//! An entry's rank is the number of entries on its board whose value is not
//! lower than its own, itself included. Tied values therefore share a rank.

use crate::domain::ports::LeaderboardSession;
use crate::domain::{BoardEntry, Error, ErrorReason, ScoreKey};

/// Aggregates describing where one entry sits on its board.
///
/// All three fields must come from the same snapshot of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    /// The entry's own value.
    pub value: i32,
    /// Number of entries on the board, including this one.
    pub count: u64,
    /// Number of entries with a strictly lower value.
    pub lower: u64,
}

/// Position of an entry on its board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRank {
    /// Entries scoring at least as high, itself included.
    pub rank: u64,
    /// Share of the other entries scoring strictly lower, in whole percent.
    pub percentile: u8,
}

impl UserRank {
    /// Derive rank and percentile from board aggregates.
    ///
    /// A lone entry is rank 1 at the 100th percentile.
    ///
    /// # Examples
    /// ```
    /// use leaderboard::domain::{Standing, UserRank};
    ///
    /// let rank = UserRank::from_standing(Standing { value: 30, count: 3, lower: 1 });
    /// assert_eq!(rank, UserRank { rank: 2, percentile: 50 });
    /// ```
    #[must_use]
    pub fn from_standing(standing: Standing) -> Self {
        let Standing { count, lower, .. } = standing;
        if count <= 1 {
            return Self {
                rank: 1,
                percentile: 100,
            };
        }
        // lower <= count - 1, so the quotient never exceeds 100.
        let percentile = (lower.min(count - 1) * 100) / (count - 1);
        Self {
            rank: count - lower.min(count - 1),
            percentile: u8::try_from(percentile).unwrap_or(100),
        }
    }
}

/// A top-K board plus the requesting user's own standing on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopScores {
    /// Up to K entries, highest value first.
    pub scores: Vec<BoardEntry>,
    /// The requester's value, or `0` when they have no entry.
    pub user_score: i32,
    /// The requester's rank, or `-1` when they have no entry.
    pub user_rank: i64,
}

/// Computes ranks against a store session.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankEngine;

impl RankEngine {
    /// Rank the entry identified by `key`.
    ///
    /// Checks run in order: the app must exist, the score name must have at
    /// least one entry under that app, the user must exist, and the user
    /// must hold an entry on that board.
    pub async fn rank(
        &self,
        session: &mut dyn LeaderboardSession,
        key: &ScoreKey,
    ) -> Result<UserRank, Error> {
        if !session.app_exists(&key.app_id).await? {
            return Err(ErrorReason::AppNotFound.into());
        }
        let names = session.distinct_score_names(&key.app_id).await?;
        if !names.contains(&key.score_name) {
            return Err(ErrorReason::ScoreNameNotFound.into());
        }
        if !session.user_exists(&key.user_id).await? {
            return Err(ErrorReason::UserNotFound.into());
        }
        let standing = session
            .standing(key)
            .await?
            .ok_or(ErrorReason::ScoreNameNotFound)?;
        Ok(UserRank::from_standing(standing))
    }
}
