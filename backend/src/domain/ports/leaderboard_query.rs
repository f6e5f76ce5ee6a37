//! Driving port for leaderboard reads.

use async_trait::async_trait;

use crate::domain::{
    Error, Nickname, ParamSet, SignedParams, SignedRequest, TopScores, UserId, UserRank, UserScore,
};

/// Parameters of `GET /user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetUserRequest {
    /// App whose entries are listed.
    pub app_id: String,
    /// User to fetch.
    pub user_id: String,
}

impl SignedParams for GetUserRequest {
    fn param_set(&self) -> ParamSet {
        ParamSet::new()
            .with("appId", &self.app_id)
            .with("userId", &self.user_id)
    }
}

/// Parameters of `GET /user/rank`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRankRequest {
    /// Owning app.
    pub app_id: String,
    /// Board within the app.
    pub score_name: String,
    /// Entrant.
    pub user_id: String,
}

impl SignedParams for UserRankRequest {
    fn param_set(&self) -> ParamSet {
        ParamSet::new()
            .with("appId", &self.app_id)
            .with("scoreName", &self.score_name)
            .with("userId", &self.user_id)
    }
}

/// Parameters of `GET /leaderboard/top`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopScoresRequest {
    /// Owning app.
    pub app_id: String,
    /// Requesting user, whose own standing is reported too.
    pub user_id: String,
    /// Board within the app.
    pub score_name: String,
    /// Maximum number of entries; must not be negative.
    pub k: i64,
}

impl SignedParams for TopScoresRequest {
    fn param_set(&self) -> ParamSet {
        ParamSet::new()
            .with("appId", &self.app_id)
            .with("userId", &self.user_id)
            .with("scoreName", &self.score_name)
            .with("k", self.k)
    }
}

/// A user with their entries under one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// User id.
    pub id: UserId,
    /// Current nickname.
    pub nickname: Nickname,
    /// Entries ordered by score name.
    pub scores: Vec<UserScore>,
}

/// Driving port for leaderboard reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaderboardQuery: Send + Sync {
    /// Fetch a user and their entries under an app.
    async fn get_user(&self, request: SignedRequest<GetUserRequest>)
    -> Result<UserProfile, Error>;

    /// Rank and percentile of one entry.
    async fn user_rank(&self, request: SignedRequest<UserRankRequest>)
    -> Result<UserRank, Error>;

    /// The top `k` entries of a board plus the requester's standing.
    async fn top_scores(&self, request: SignedRequest<TopScoresRequest>)
    -> Result<TopScores, Error>;
}
