//! Integration tests for `DieselLeaderboardStore` against embedded PostgreSQL.
//!
//! These tests check the behaviour the in-memory store can only imitate:
//! the `ON CONFLICT` upsert, the single-statement standing aggregates, the
//! cascading foreign keys and the unique-violation mapping.
//!
//! Each test gets its own database cloned from a migrated template. Tests
//! stay synchronous and drive the store on a Tokio runtime owned by the
//! test context.

#[path = "support/embedded_postgres.rs"]
mod embedded_postgres;

use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt as _;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

use leaderboard::domain::ports::{LeaderboardSession, LeaderboardStore, SessionFuture};
use leaderboard::domain::{
    App, AppId, AppName, BoardKey, Error, ErrorCode, ErrorReason, Nickname, ScoreKey, ScoreName,
    Standing, User, UserId, UserRank,
};
use leaderboard::outbound::persistence::{DbPool, DieselLeaderboardStore, PoolConfig};

use embedded_postgres::{handle_cluster_setup_failure, migrated_database};

// -----------------------------------------------------------------------------
// Test Context
// -----------------------------------------------------------------------------

struct TestContext {
    /// Tokio runtime reused for every store call in one test.
    runtime: Runtime,
    store: DieselLeaderboardStore,
    app_id: AppId,
    _database: TemporaryDatabase,
}

impl TestContext {
    fn run<T, F>(&self, work: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: for<'s> FnOnce(&'s mut dyn LeaderboardSession) -> SessionFuture<'s, T> + Send + 'static,
    {
        self.runtime.block_on(self.store.run(work))
    }

    fn register(&self, user_id: &str, nickname: &str) -> Result<(), Error> {
        let user = User {
            id: UserId::new(user_id).expect("user id"),
            nickname: Nickname::new(nickname).expect("nickname"),
            created_at: Utc::now(),
        };
        self.run(move |session| {
            async move {
                session.insert_user(&user).await?;
                Ok(())
            }
            .boxed()
        })
    }

    fn key(&self, score_name: &str, user_id: &str) -> ScoreKey {
        ScoreKey {
            app_id: self.app_id,
            score_name: ScoreName::new(score_name).expect("score name"),
            user_id: UserId::new(user_id).expect("user id"),
        }
    }

    fn board(&self, score_name: &str) -> BoardKey {
        BoardKey {
            app_id: self.app_id,
            score_name: ScoreName::new(score_name).expect("score name"),
        }
    }

    fn submit(&self, score_name: &str, user_id: &str, value: i32) {
        let key = self.key(score_name, user_id);
        self.run(move |session| {
            async move {
                session.upsert_score(&key, value).await?;
                Ok(())
            }
            .boxed()
        })
        .expect("upsert succeeds");
    }

    fn standing(&self, score_name: &str, user_id: &str) -> Option<Standing> {
        let key = self.key(score_name, user_id);
        self.run(move |session| async move { Ok(session.standing(&key).await?) }.boxed())
            .expect("standing query succeeds")
    }

    fn top(&self, score_name: &str, limit: u64) -> Vec<(String, i32)> {
        let board = self.board(score_name);
        self.run(move |session| {
            async move {
                let entries = session.top_scores(&board, limit).await?;
                Ok(entries
                    .into_iter()
                    .map(|entry| (entry.user_id.to_string(), entry.value))
                    .collect())
            }
            .boxed()
        })
        .expect("top scores query succeeds")
    }
}

fn setup_test_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let database = migrated_database()?;
    let config = PoolConfig::new(database.url())
        .with_max_size(8)
        .with_min_idle(Some(1))
        .with_checkout_timeout(Duration::from_secs(5));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;
    let store = DieselLeaderboardStore::new(pool);

    let app = App {
        id: AppId::random(),
        name: AppName::new("Arcade").map_err(|err| err.to_string())?,
    };
    let app_id = app.id;
    runtime
        .block_on(store.run(move |session| {
            async move {
                session.insert_app(&app).await?;
                Ok(())
            }
            .boxed()
        }))
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        store,
        app_id,
        _database: database,
    })
}

#[fixture]
fn diesel_world() -> Option<TestContext> {
    match setup_test_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[rstest]
fn resubmitting_keeps_one_row_with_the_latest_value(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: resubmitting_keeps_one_row_with_the_latest_value skipped");
        return;
    };
    ctx.register("alice", "Ada").expect("register alice");

    ctx.submit("arcade", "alice", 10);
    ctx.submit("arcade", "alice", 42);

    assert_eq!(ctx.top("arcade", 10), vec![("alice".to_owned(), 42)]);
    assert_eq!(
        ctx.standing("arcade", "alice"),
        Some(Standing {
            value: 42,
            count: 1,
            lower: 0
        })
    );
}

#[rstest]
fn concurrent_submissions_to_one_key_leave_one_row(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_submissions_to_one_key_leave_one_row skipped");
        return;
    };
    ctx.register("alice", "Ada").expect("register alice");

    let submissions = (1..=8).map(|value| {
        let key = ctx.key("arcade", "alice");
        ctx.store.run(move |session| {
            async move {
                session.upsert_score(&key, value).await?;
                Ok(())
            }
            .boxed()
        })
    });
    let outcomes = ctx
        .runtime
        .block_on(futures_util::future::join_all(submissions));

    assert!(outcomes.iter().all(Result::is_ok), "{outcomes:?}");
    let board = ctx.top("arcade", 10);
    assert_eq!(board.len(), 1);
    assert!((1..=8).contains(&board[0].1));
}

#[rstest]
fn ties_share_a_rank_through_the_standing_query(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: ties_share_a_rank_through_the_standing_query skipped");
        return;
    };
    for (user, value) in [("u1", 120), ("u2", 80), ("u3", 80)] {
        ctx.register(user, user).expect("register");
        ctx.submit("arcade", user, value);
    }
    ctx.submit("puzzle", "u1", 5);

    let rank = |user: &str| UserRank::from_standing(ctx.standing("arcade", user).expect("entry"));

    assert_eq!(
        ctx.standing("arcade", "u1"),
        Some(Standing {
            value: 120,
            count: 3,
            lower: 2
        })
    );
    assert_eq!((rank("u1").rank, rank("u1").percentile), (1, 100));
    assert_eq!((rank("u2").rank, rank("u2").percentile), (3, 0));
    assert_eq!(rank("u2"), rank("u3"));
    assert_eq!(ctx.standing("puzzle", "u2"), None);
}

#[rstest]
fn top_scores_order_ties_by_user_id(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: top_scores_order_ties_by_user_id skipped");
        return;
    };
    for (user, value) in [("carol", 80), ("alice", 120), ("bob", 80)] {
        ctx.register(user, user).expect("register");
        ctx.submit("arcade", user, value);
    }

    assert_eq!(
        ctx.top("arcade", 2),
        vec![("alice".to_owned(), 120), ("bob".to_owned(), 80)]
    );
    assert!(ctx.top("arcade", 0).is_empty());
}

#[rstest]
fn deleting_a_user_cascades_to_their_scores(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: deleting_a_user_cascades_to_their_scores skipped");
        return;
    };
    for user in ["alice", "bob"] {
        ctx.register(user, user).expect("register");
        ctx.submit("arcade", user, 10);
        ctx.submit("puzzle", user, 20);
    }

    let alice = UserId::new("alice").expect("user id");
    let deleted = ctx
        .run(move |session| async move { Ok(session.delete_user(&alice).await?) }.boxed())
        .expect("delete succeeds");

    assert!(deleted);
    assert_eq!(ctx.top("arcade", 10), vec![("bob".to_owned(), 10)]);
    assert_eq!(ctx.top("puzzle", 10), vec![("bob".to_owned(), 20)]);
    assert_eq!(ctx.standing("arcade", "alice"), None);
}

#[rstest]
fn duplicate_registration_is_already_registered(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: duplicate_registration_is_already_registered skipped");
        return;
    };
    ctx.register("alice", "Ada").expect("first registration");

    let error = ctx
        .register("alice", "Other")
        .expect_err("second registration fails");

    assert_eq!(error.reason(), Some(ErrorReason::AlreadyRegistered));
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
fn submitting_for_an_unregistered_user_is_an_internal_error(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!(
            "SKIP-TEST-CLUSTER: submitting_for_an_unregistered_user_is_an_internal_error skipped"
        );
        return;
    };
    let key = ctx.key("arcade", "ghost");

    let error = ctx
        .run(move |session| {
            async move {
                session.upsert_score(&key, 1).await?;
                Ok(())
            }
            .boxed()
        })
        .expect_err("foreign key rejects the row");

    assert_eq!(error.code(), ErrorCode::InternalError);
    assert!(ctx.top("arcade", 10).is_empty());
}

#[rstest]
fn failed_units_of_work_roll_back(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: failed_units_of_work_roll_back skipped");
        return;
    };
    ctx.register("alice", "Ada").expect("register alice");
    let key = ctx.key("arcade", "alice");

    let outcome: Result<(), Error> = ctx.run(move |session| {
        async move {
            session.upsert_score(&key, 99).await?;
            Err(ErrorReason::ScoreNameNotFound.into())
        }
        .boxed()
    });

    assert!(outcome.is_err());
    assert_eq!(ctx.standing("arcade", "alice"), None);
}
