//! Driven port for leaderboard persistence.
//!
//! The store hands out a [`LeaderboardSession`] scoped to one transaction.
//! Everything a single request reads or writes goes through that session so
//! that it commits or rolls back as a unit. Sessions expose three facets:
//! [`UserRegistry`], [`AppRegistry`] and [`ScoreStore`].

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::domain::{
    App, AppId, BoardEntry, BoardKey, Error, Nickname, ScoreKey, ScoreName, Standing, User,
    UserId, UserScore,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by leaderboard store adapters.
    pub enum LeaderboardStoreError {
        /// The store could not be reached or no connection was available.
        Connection { message: String } =>
            "leaderboard store connection failed: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } =>
            "leaderboard store query failed: {message}",
        /// A user with this id already exists.
        DuplicateUser { user_id: String } =>
            "user {user_id} already registered",
    }
}

impl From<LeaderboardStoreError> for Error {
    fn from(error: LeaderboardStoreError) -> Self {
        match error {
            LeaderboardStoreError::Connection { message } => {
                Error::service_unavailable(format!("leaderboard store unavailable: {message}"))
            }
            LeaderboardStoreError::Query { message } => {
                Error::internal(format!("leaderboard store error: {message}"))
            }
            LeaderboardStoreError::DuplicateUser { .. } => {
                crate::domain::ErrorReason::AlreadyRegistered.into()
            }
        }
    }
}

/// User records.
#[async_trait]
pub trait UserRegistry: Send {
    /// Insert a new user.
    ///
    /// Fails with [`LeaderboardStoreError::DuplicateUser`] when the id is
    /// taken.
    async fn insert_user(&mut self, user: &User) -> Result<(), LeaderboardStoreError>;

    /// Fetch a user by id.
    async fn find_user(&mut self, id: &UserId) -> Result<Option<User>, LeaderboardStoreError>;

    /// Whether a user with this id exists.
    async fn user_exists(&mut self, id: &UserId) -> Result<bool, LeaderboardStoreError>;

    /// Overwrite a user's nickname. Returns `false` when the user is absent.
    async fn rename_user(
        &mut self,
        id: &UserId,
        nickname: &Nickname,
    ) -> Result<bool, LeaderboardStoreError>;

    /// Delete a user and, by cascade, all of their score entries. Returns
    /// `false` when the user is absent.
    async fn delete_user(&mut self, id: &UserId) -> Result<bool, LeaderboardStoreError>;

    /// Delete every user (and every score entry). Returns the number of
    /// users removed.
    async fn delete_all_users(&mut self) -> Result<u64, LeaderboardStoreError>;
}

/// App records.
#[async_trait]
pub trait AppRegistry: Send {
    /// Whether an app with this id exists.
    async fn app_exists(&mut self, id: &AppId) -> Result<bool, LeaderboardStoreError>;

    /// Insert a new app.
    async fn insert_app(&mut self, app: &App) -> Result<(), LeaderboardStoreError>;

    /// Delete every app (and every score entry). Returns the number of apps
    /// removed.
    async fn delete_all_apps(&mut self) -> Result<u64, LeaderboardStoreError>;
}

/// Score entries and the aggregates ranking needs.
#[async_trait]
pub trait ScoreStore: Send {
    /// Distinct score names recorded under an app.
    async fn distinct_score_names(
        &mut self,
        app_id: &AppId,
    ) -> Result<Vec<ScoreName>, LeaderboardStoreError>;

    /// All of a user's entries under an app, ordered by score name.
    async fn user_scores(
        &mut self,
        app_id: &AppId,
        user_id: &UserId,
    ) -> Result<Vec<UserScore>, LeaderboardStoreError>;

    /// Atomically insert the entry or replace its value.
    ///
    /// Implementations must not read-then-write: two concurrent upserts on
    /// one key must leave exactly one row holding one of the two values.
    async fn upsert_score(&mut self, key: &ScoreKey, value: i32)
    -> Result<(), LeaderboardStoreError>;

    /// Delete the entry under `key`. Returns `false` when absent.
    async fn delete_score(&mut self, key: &ScoreKey) -> Result<bool, LeaderboardStoreError>;

    /// The entry's value with the board's `count` and `lower` aggregates,
    /// read from one snapshot. `None` when the entry is absent.
    async fn standing(&mut self, key: &ScoreKey)
    -> Result<Option<Standing>, LeaderboardStoreError>;

    /// Up to `limit` entries of a board, highest value first, ties by user
    /// id ascending.
    async fn top_scores(
        &mut self,
        board: &BoardKey,
        limit: u64,
    ) -> Result<Vec<BoardEntry>, LeaderboardStoreError>;
}

/// All store facets available inside one transaction.
pub trait LeaderboardSession: UserRegistry + AppRegistry + ScoreStore {}

impl<T> LeaderboardSession for T where T: UserRegistry + AppRegistry + ScoreStore + ?Sized {}

/// Unit of work executed inside a single store transaction.
pub type SessionFuture<'s, T> = BoxFuture<'s, Result<T, Error>>;

/// Transactional leaderboard store.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// Run `work` inside one transaction.
    ///
    /// The transaction commits when `work` returns `Ok` and rolls back on
    /// `Err`. The underlying connection is released on every exit path.
    /// Failing to obtain a connection is reported without waiting
    /// indefinitely.
    async fn run<T, F>(&self, work: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: for<'s> FnOnce(&'s mut dyn LeaderboardSession) -> SessionFuture<'s, T> + Send + 'static;
}
