//! Driving port for leaderboard mutations.
//!
//! Inbound adapters hand over the raw parameter strings exactly as the
//! client sent them, wrapped in a [`SignedRequest`]. The service signs the
//! raw values, so parsing into domain types happens only after the
//! checksum has been verified.

use async_trait::async_trait;

use crate::domain::{Error, Nickname, ParamSet, SignedParams, SignedRequest, UserRank};

/// Parameters of `POST /user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserRequest {
    /// Requested user id.
    pub user_id: String,
    /// Requested nickname; blank or absent selects a placeholder.
    pub nickname: Option<String>,
}

impl SignedParams for RegisterUserRequest {
    fn param_set(&self) -> ParamSet {
        ParamSet::new()
            .with("userId", &self.user_id)
            .with_optional("nickname", self.nickname.as_deref())
    }
}

/// Parameters of `PUT /user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNicknameRequest {
    /// User to rename.
    pub user_id: String,
    /// New nickname.
    pub nickname: String,
}

impl SignedParams for UpdateNicknameRequest {
    fn param_set(&self) -> ParamSet {
        ParamSet::new()
            .with("userId", &self.user_id)
            .with("nickname", &self.nickname)
    }
}

/// Parameters of `DELETE /user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteUserRequest {
    /// User to delete.
    pub user_id: String,
}

impl SignedParams for DeleteUserRequest {
    fn param_set(&self) -> ParamSet {
        ParamSet::new().with("userId", &self.user_id)
    }
}

/// Parameters of `POST /leaderboard`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitScoreRequest {
    /// Owning app.
    pub app_id: String,
    /// Board within the app.
    pub score_name: String,
    /// New value for the entry.
    pub value: i32,
    /// Entrant.
    pub user_id: String,
}

impl SignedParams for SubmitScoreRequest {
    fn param_set(&self) -> ParamSet {
        ParamSet::new()
            .with("appId", &self.app_id)
            .with("scoreName", &self.score_name)
            .with("value", self.value)
            .with("userId", &self.user_id)
    }
}

/// Parameters of `DELETE /leaderboard`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteScoreRequest {
    /// Owning app.
    pub app_id: String,
    /// Board within the app.
    pub score_name: String,
    /// Entrant.
    pub user_id: String,
}

impl SignedParams for DeleteScoreRequest {
    fn param_set(&self) -> ParamSet {
        ParamSet::new()
            .with("appId", &self.app_id)
            .with("scoreName", &self.score_name)
            .with("userId", &self.user_id)
    }
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registered {
    /// Nickname stored for the new user.
    pub nickname: Nickname,
}

/// Driving port for leaderboard mutations.
///
/// Every method authenticates its request before any store access and runs
/// its store work inside a single transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaderboardCommand: Send + Sync {
    /// Register a new user.
    ///
    /// # Errors
    ///
    /// `AlreadyRegistered` when the id is taken; `invalid_request` when the
    /// id or nickname fail validation.
    async fn register_user(
        &self,
        request: SignedRequest<RegisterUserRequest>,
    ) -> Result<Registered, Error>;

    /// Overwrite an existing user's nickname.
    async fn update_nickname(
        &self,
        request: SignedRequest<UpdateNicknameRequest>,
    ) -> Result<(), Error>;

    /// Delete a user and all of their entries.
    async fn delete_user(&self, request: SignedRequest<DeleteUserRequest>) -> Result<(), Error>;

    /// Insert or replace a score and return the entry's fresh rank.
    async fn submit_score(
        &self,
        request: SignedRequest<SubmitScoreRequest>,
    ) -> Result<UserRank, Error>;

    /// Delete one score entry.
    async fn delete_score(&self, request: SignedRequest<DeleteScoreRequest>)
    -> Result<(), Error>;
}
