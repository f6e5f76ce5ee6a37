//! Test utilities for the leaderboard crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for `cfg(test)` and behind the `test-support` feature.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use tokio::sync::Mutex;

use crate::domain::ports::{
    AppRegistry, LeaderboardSession, LeaderboardStore, LeaderboardStoreError, ScoreStore,
    SessionFuture, UserRegistry,
};
use crate::domain::{
    App, AppId, BoardEntry, BoardKey, Error, Nickname, ScoreKey, ScoreName, Standing, User,
    UserId, UserScore,
};

/// Clock frozen at a fixed instant.
///
/// The default instant is 2024-05-01T12:00:00.123456Z, so placeholder
/// nicknames come out as `user_123456`.
#[derive(Debug, Clone, Copy)]
pub struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl FixtureClock {
    /// Freeze the clock at `utc_now`.
    #[must_use]
    pub fn at(utc_now: DateTime<Utc>) -> Self {
        Self { utc_now }
    }
}

impl Default for FixtureClock {
    fn default() -> Self {
        Self::at(DateTime::<Utc>::UNIX_EPOCH + TimeDelta::microseconds(1_714_564_800_123_456))
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

type ScoreRow = (AppId, ScoreName, UserId);

/// Committed contents of an [`InMemoryLeaderboardStore`].
///
/// Mirrors the relational schema: scores reference both a user and an app
/// and disappear with either.
#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    apps: BTreeMap<AppId, App>,
    scores: BTreeMap<ScoreRow, i32>,
}

impl MemoryState {
    fn row(key: &ScoreKey) -> ScoreRow {
        (key.app_id, key.score_name.clone(), key.user_id.clone())
    }

    fn board_values(&self, board: &BoardKey) -> impl Iterator<Item = (&UserId, i32)> {
        self.scores
            .iter()
            .filter(move |((app_id, score_name, _), _)| {
                *app_id == board.app_id && *score_name == board.score_name
            })
            .map(|((_, _, user_id), value)| (user_id, *value))
    }
}

#[async_trait]
impl UserRegistry for MemoryState {
    async fn insert_user(&mut self, user: &User) -> Result<(), LeaderboardStoreError> {
        if self.users.contains_key(&user.id) {
            return Err(LeaderboardStoreError::duplicate_user(user.id.as_ref()));
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&mut self, id: &UserId) -> Result<Option<User>, LeaderboardStoreError> {
        Ok(self.users.get(id).cloned())
    }

    async fn user_exists(&mut self, id: &UserId) -> Result<bool, LeaderboardStoreError> {
        Ok(self.users.contains_key(id))
    }

    async fn rename_user(
        &mut self,
        id: &UserId,
        nickname: &Nickname,
    ) -> Result<bool, LeaderboardStoreError> {
        let Some(user) = self.users.get_mut(id) else {
            return Ok(false);
        };
        user.nickname = nickname.clone();
        Ok(true)
    }

    async fn delete_user(&mut self, id: &UserId) -> Result<bool, LeaderboardStoreError> {
        if self.users.remove(id).is_none() {
            return Ok(false);
        }
        self.scores.retain(|(_, _, user_id), _| user_id != id);
        Ok(true)
    }

    async fn delete_all_users(&mut self) -> Result<u64, LeaderboardStoreError> {
        let removed = self.users.len() as u64;
        self.users.clear();
        self.scores.clear();
        Ok(removed)
    }
}

#[async_trait]
impl AppRegistry for MemoryState {
    async fn app_exists(&mut self, id: &AppId) -> Result<bool, LeaderboardStoreError> {
        Ok(self.apps.contains_key(id))
    }

    async fn insert_app(&mut self, app: &App) -> Result<(), LeaderboardStoreError> {
        if self.apps.contains_key(&app.id) {
            return Err(LeaderboardStoreError::query(format!(
                "duplicate key value violates unique constraint \"apps_pkey\" ({})",
                app.id
            )));
        }
        self.apps.insert(app.id, app.clone());
        Ok(())
    }

    async fn delete_all_apps(&mut self) -> Result<u64, LeaderboardStoreError> {
        let removed = self.apps.len() as u64;
        self.apps.clear();
        self.scores.clear();
        Ok(removed)
    }
}

#[async_trait]
impl ScoreStore for MemoryState {
    async fn distinct_score_names(
        &mut self,
        app_id: &AppId,
    ) -> Result<Vec<ScoreName>, LeaderboardStoreError> {
        let names: BTreeSet<ScoreName> = self
            .scores
            .keys()
            .filter(|(app, _, _)| app == app_id)
            .map(|(_, name, _)| name.clone())
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn user_scores(
        &mut self,
        app_id: &AppId,
        user_id: &UserId,
    ) -> Result<Vec<UserScore>, LeaderboardStoreError> {
        Ok(self
            .scores
            .iter()
            .filter(|((app, _, user), _)| app == app_id && user == user_id)
            .map(|((_, score_name, _), value)| UserScore {
                score_name: score_name.clone(),
                value: *value,
            })
            .collect())
    }

    async fn upsert_score(
        &mut self,
        key: &ScoreKey,
        value: i32,
    ) -> Result<(), LeaderboardStoreError> {
        if !self.apps.contains_key(&key.app_id) || !self.users.contains_key(&key.user_id) {
            return Err(LeaderboardStoreError::query(
                "insert or update on table \"leaderboards\" violates foreign key constraint",
            ));
        }
        self.scores.insert(Self::row(key), value);
        Ok(())
    }

    async fn delete_score(&mut self, key: &ScoreKey) -> Result<bool, LeaderboardStoreError> {
        Ok(self.scores.remove(&Self::row(key)).is_some())
    }

    async fn standing(
        &mut self,
        key: &ScoreKey,
    ) -> Result<Option<Standing>, LeaderboardStoreError> {
        let Some(value) = self.scores.get(&Self::row(key)).copied() else {
            return Ok(None);
        };
        let board = key.board();
        let (count, lower) = self
            .board_values(&board)
            .fold((0_u64, 0_u64), |(count, lower), (_, other)| {
                (count + 1, lower + u64::from(other < value))
            });
        Ok(Some(Standing {
            value,
            count,
            lower,
        }))
    }

    async fn top_scores(
        &mut self,
        board: &BoardKey,
        limit: u64,
    ) -> Result<Vec<BoardEntry>, LeaderboardStoreError> {
        let mut entries: Vec<(&UserId, i32)> = self.board_values(board).collect();
        entries.sort_by(|(a_id, a_value), (b_id, b_value)| {
            b_value.cmp(a_value).then_with(|| a_id.cmp(b_id))
        });
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        entries
            .into_iter()
            .take(limit)
            .map(|(user_id, value)| {
                let user = self.users.get(user_id).ok_or_else(|| {
                    LeaderboardStoreError::query(format!("dangling score for user {user_id}"))
                })?;
                Ok(BoardEntry {
                    user_id: user.id.clone(),
                    nickname: user.nickname.clone(),
                    value,
                })
            })
            .collect()
    }
}

/// Leaderboard store held in process memory.
///
/// Transactions are serialised by a mutex and applied to a working copy
/// that replaces the committed state only when the unit of work succeeds.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLeaderboardStore {
    state: Arc<Mutex<MemoryState>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryLeaderboardStore {
    /// Make every subsequent `run` fail as if no connection were available.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Insert an app directly, bypassing any service.
    pub async fn seed_app(&self, app: App) {
        self.state.lock().await.apps.insert(app.id, app);
    }

    /// Whether an app is stored.
    pub async fn has_app(&self, id: &AppId) -> bool {
        self.state.lock().await.apps.contains_key(id)
    }

    /// Stored user, if any.
    pub async fn user(&self, id: &UserId) -> Option<User> {
        self.state.lock().await.users.get(id).cloned()
    }

    /// Number of stored users.
    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    /// Number of stored score entries across all boards.
    pub async fn score_count(&self) -> usize {
        self.state.lock().await.scores.len()
    }

    /// Entire board in ranking order.
    pub async fn board(&self, board: &BoardKey) -> Vec<BoardEntry> {
        let mut state = self.state.lock().await;
        state.top_scores(board, u64::MAX).await.unwrap_or_default()
    }
}

#[async_trait]
impl LeaderboardStore for InMemoryLeaderboardStore {
    async fn run<T, F>(&self, work: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: for<'s> FnOnce(&'s mut dyn LeaderboardSession) -> SessionFuture<'s, T> + Send + 'static,
    {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LeaderboardStoreError::connection("in-memory store is offline").into());
        }
        let mut committed = self.state.lock().await;
        let mut working = committed.clone();
        let session: &mut dyn LeaderboardSession = &mut working;
        let outcome = work(session).await;
        if outcome.is_ok() {
            *committed = working;
        }
        outcome
    }
}
