//! PostgreSQL-backed leaderboard store.
//!
//! Each [`LeaderboardStore::run`] checks out one pooled connection, opens a
//! transaction on it, and hands the unit of work a [`DieselSession`] bound
//! to that transaction. The connection returns to the pool when `run`
//! finishes, whichever way it finishes.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{Uuid as SqlUuid, Varchar};
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{
    AppRegistry, LeaderboardSession, LeaderboardStore, LeaderboardStoreError, ScoreStore,
    SessionFuture, UserRegistry,
};
use crate::domain::{
    App, AppId, BoardEntry, BoardKey, Error, Nickname, ScoreKey, ScoreName, Standing, User,
    UserId, UserScore,
};

use super::error_mapping::{map_diesel_error, map_pool_error, map_user_insert_error};
use super::models::{NewAppRow, NewScoreRow, NewUserRow, StandingRow, UserRow};
use super::pool::DbPool;
use super::schema::{apps, leaderboards, users};

/// Value, board size, and strictly-lower count read in one statement so the
/// two aggregates share a snapshot.
const STANDING_SQL: &str = "\
SELECT target.value AS value, \
       (SELECT COUNT(*) FROM leaderboards board \
         WHERE board.app_id = target.app_id AND board.score_name = target.score_name) \
         AS entrant_count, \
       (SELECT COUNT(*) FROM leaderboards board \
         WHERE board.app_id = target.app_id AND board.score_name = target.score_name \
           AND board.value < target.value) \
         AS lower_count \
  FROM leaderboards target \
 WHERE target.app_id = $1 AND target.score_name = $2 AND target.user_id = $3";

/// Diesel-backed implementation of the [`LeaderboardStore`] port.
#[derive(Clone)]
pub struct DieselLeaderboardStore {
    pool: DbPool,
}

impl DieselLeaderboardStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Why a transaction did not commit.
enum TransactionFailure {
    Database(diesel::result::Error),
    Aborted(Error),
}

impl From<diesel::result::Error> for TransactionFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

#[async_trait]
impl LeaderboardStore for DieselLeaderboardStore {
    async fn run<T, F>(&self, work: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: for<'s> FnOnce(&'s mut dyn LeaderboardSession) -> SessionFuture<'s, T> + Send + 'static,
    {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let outcome = conn
            .transaction::<T, TransactionFailure, _>(|conn| {
                async move {
                    let mut session = DieselSession { conn };
                    let session: &mut dyn LeaderboardSession = &mut session;
                    work(session).await.map_err(TransactionFailure::Aborted)
                }
                .scope_boxed()
            })
            .await;

        match outcome {
            Ok(value) => Ok(value),
            Err(TransactionFailure::Aborted(error)) => Err(error),
            Err(TransactionFailure::Database(error)) => Err(map_diesel_error(error).into()),
        }
    }
}

/// Store facets bound to one open transaction.
struct DieselSession<'c> {
    conn: &'c mut AsyncPgConnection,
}

fn limit_to_sql(limit: u64) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn count_to_u64(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

fn stored_user_id(raw: String) -> Result<UserId, LeaderboardStoreError> {
    UserId::new(raw).map_err(|err| LeaderboardStoreError::query(format!("stored user id: {err}")))
}

fn stored_nickname(raw: String) -> Result<Nickname, LeaderboardStoreError> {
    Nickname::new(raw).map_err(|err| LeaderboardStoreError::query(format!("stored nickname: {err}")))
}

fn stored_score_name(raw: String) -> Result<ScoreName, LeaderboardStoreError> {
    ScoreName::new(raw)
        .map_err(|err| LeaderboardStoreError::query(format!("stored score name: {err}")))
}

fn stored_count(raw: i64) -> Result<u64, LeaderboardStoreError> {
    u64::try_from(raw).map_err(|_| LeaderboardStoreError::query("negative row count"))
}

fn user_from_row(row: UserRow) -> Result<User, LeaderboardStoreError> {
    Ok(User {
        id: stored_user_id(row.id)?,
        nickname: stored_nickname(row.nickname)?,
        created_at: row.created_at,
    })
}

#[async_trait]
impl UserRegistry for DieselSession<'_> {
    async fn insert_user(&mut self, user: &User) -> Result<(), LeaderboardStoreError> {
        let row = NewUserRow {
            id: user.id.as_ref(),
            nickname: user.nickname.as_ref(),
            created_at: user.created_at,
        };
        diesel::insert_into(users::table)
            .values(&row)
            .execute(self.conn)
            .await
            .map_err(|err| map_user_insert_error(err, user.id.as_ref()))?;
        Ok(())
    }

    async fn find_user(&mut self, id: &UserId) -> Result<Option<User>, LeaderboardStoreError> {
        users::table
            .find(id.as_ref())
            .select(UserRow::as_select())
            .first(self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(user_from_row)
            .transpose()
    }

    async fn user_exists(&mut self, id: &UserId) -> Result<bool, LeaderboardStoreError> {
        diesel::select(diesel::dsl::exists(users::table.find(id.as_ref())))
            .get_result(self.conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn rename_user(
        &mut self,
        id: &UserId,
        nickname: &Nickname,
    ) -> Result<bool, LeaderboardStoreError> {
        let updated = diesel::update(users::table.find(id.as_ref()))
            .set(users::nickname.eq(nickname.as_ref()))
            .execute(self.conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete_user(&mut self, id: &UserId) -> Result<bool, LeaderboardStoreError> {
        let deleted = diesel::delete(users::table.find(id.as_ref()))
            .execute(self.conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn delete_all_users(&mut self) -> Result<u64, LeaderboardStoreError> {
        let deleted = diesel::delete(users::table)
            .execute(self.conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_to_u64(deleted))
    }
}

#[async_trait]
impl AppRegistry for DieselSession<'_> {
    async fn app_exists(&mut self, id: &AppId) -> Result<bool, LeaderboardStoreError> {
        diesel::select(diesel::dsl::exists(apps::table.find(*id.as_uuid())))
            .get_result(self.conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn insert_app(&mut self, app: &App) -> Result<(), LeaderboardStoreError> {
        let row = NewAppRow {
            id: *app.id.as_uuid(),
            name: app.name.as_ref(),
        };
        diesel::insert_into(apps::table)
            .values(&row)
            .execute(self.conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn delete_all_apps(&mut self) -> Result<u64, LeaderboardStoreError> {
        let deleted = diesel::delete(apps::table)
            .execute(self.conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_to_u64(deleted))
    }
}

#[async_trait]
impl ScoreStore for DieselSession<'_> {
    async fn distinct_score_names(
        &mut self,
        app_id: &AppId,
    ) -> Result<Vec<ScoreName>, LeaderboardStoreError> {
        let names: Vec<String> = leaderboards::table
            .filter(leaderboards::app_id.eq(*app_id.as_uuid()))
            .select(leaderboards::score_name)
            .distinct()
            .order(leaderboards::score_name.asc())
            .load(self.conn)
            .await
            .map_err(map_diesel_error)?;
        names.into_iter().map(stored_score_name).collect()
    }

    async fn user_scores(
        &mut self,
        app_id: &AppId,
        user_id: &UserId,
    ) -> Result<Vec<UserScore>, LeaderboardStoreError> {
        let rows: Vec<(String, i32)> = leaderboards::table
            .filter(leaderboards::app_id.eq(*app_id.as_uuid()))
            .filter(leaderboards::user_id.eq(user_id.as_ref()))
            .select((leaderboards::score_name, leaderboards::value))
            .order(leaderboards::score_name.asc())
            .load(self.conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|(score_name, value)| {
                Ok(UserScore {
                    score_name: stored_score_name(score_name)?,
                    value,
                })
            })
            .collect()
    }

    async fn upsert_score(
        &mut self,
        key: &ScoreKey,
        value: i32,
    ) -> Result<(), LeaderboardStoreError> {
        let row = NewScoreRow {
            score_name: key.score_name.as_ref(),
            user_id: key.user_id.as_ref(),
            app_id: *key.app_id.as_uuid(),
            value,
        };
        diesel::insert_into(leaderboards::table)
            .values(&row)
            .on_conflict((
                leaderboards::score_name,
                leaderboards::user_id,
                leaderboards::app_id,
            ))
            .do_update()
            .set((
                leaderboards::value.eq(excluded(leaderboards::value)),
                leaderboards::updated_at.eq(diesel::dsl::now),
            ))
            .execute(self.conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn delete_score(&mut self, key: &ScoreKey) -> Result<bool, LeaderboardStoreError> {
        let deleted = diesel::delete(leaderboards::table.find((
            key.score_name.as_ref(),
            key.user_id.as_ref(),
            *key.app_id.as_uuid(),
        )))
        .execute(self.conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn standing(
        &mut self,
        key: &ScoreKey,
    ) -> Result<Option<Standing>, LeaderboardStoreError> {
        let row: Option<StandingRow> = diesel::sql_query(STANDING_SQL)
            .bind::<SqlUuid, _>(*key.app_id.as_uuid())
            .bind::<Varchar, _>(key.score_name.as_ref())
            .bind::<Varchar, _>(key.user_id.as_ref())
            .get_result(self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| {
            Ok(Standing {
                value: row.value,
                count: stored_count(row.entrant_count)?,
                lower: stored_count(row.lower_count)?,
            })
        })
        .transpose()
    }

    async fn top_scores(
        &mut self,
        board: &BoardKey,
        limit: u64,
    ) -> Result<Vec<BoardEntry>, LeaderboardStoreError> {
        let rows: Vec<(String, String, i32)> = leaderboards::table
            .inner_join(users::table)
            .filter(leaderboards::app_id.eq(*board.app_id.as_uuid()))
            .filter(leaderboards::score_name.eq(board.score_name.as_ref()))
            .order((leaderboards::value.desc(), leaderboards::user_id.asc()))
            .limit(limit_to_sql(limit))
            .select((users::id, users::nickname, leaderboards::value))
            .load(self.conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|(user_id, nickname, value)| {
                Ok(BoardEntry {
                    user_id: stored_user_id(user_id)?,
                    nickname: stored_nickname(nickname)?,
                    value,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(10, 10)]
    #[case(u64::MAX, i64::MAX)]
    fn limits_saturate_at_the_sql_maximum(#[case] limit: u64, #[case] expected: i64) {
        assert_eq!(limit_to_sql(limit), expected);
    }

    #[rstest]
    fn negative_counts_are_rejected() {
        assert!(stored_count(-1).is_err());
        assert_eq!(stored_count(3), Ok(3));
    }

    #[rstest]
    fn standing_statement_binds_three_parameters() {
        assert!(STANDING_SQL.contains("$3"));
        assert!(!STANDING_SQL.contains("$4"));
    }
}
