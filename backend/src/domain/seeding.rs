//! Administrative app registration and fake-data population.
//!
//! Powers the `leaderboard-admin` binary. Apps have no HTTP surface, so
//! this is the only way to create one. Population fills the store with
//! synthetic users, apps, and scores for manual testing; it always adds a
//! fixed user and a fixed app so that hand-crafted requests have known ids.

use std::sync::Arc;

use futures_util::FutureExt as _;
use mockable::Clock;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{LeaderboardSession, LeaderboardStore};
use crate::domain::{
    App, AppId, AppName, Error, Nickname, ScoreKey, ScoreName, User, UserId,
};

/// Id of the app that population always creates.
pub const TEST_APP_ID: &str = "b3edf18d-7856-48ad-bc46-ea65043c97d9";
const TEST_APP_NAME: &str = "testapp";
const TEST_USER_ID: &str = "testid";
const TEST_USER_NICKNAME: &str = "testuser";

/// Inclusive range of generated score values.
const SCORE_RANGE: std::ops::RangeInclusive<i32> = 1..=100;

/// Errors raised while validating a population plan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedPlanError {
    /// One of the counts was zero.
    #[error("{field} must be greater than 0")]
    ZeroCount { field: &'static str },
}

/// How much synthetic data to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlan {
    num_users: u32,
    num_apps: u32,
    num_score_names: u32,
    reinit: bool,
}

impl SeedPlan {
    /// Validate the requested counts.
    ///
    /// # Examples
    /// ```
    /// use leaderboard::domain::SeedPlan;
    ///
    /// assert!(SeedPlan::new(100, 5, 4).is_ok());
    /// assert!(SeedPlan::new(0, 5, 4).is_err());
    /// ```
    pub fn new(num_users: u32, num_apps: u32, num_score_names: u32) -> Result<Self, SeedPlanError> {
        for (field, value) in [
            ("num_users", num_users),
            ("num_apps", num_apps),
            ("num_score_names", num_score_names),
        ] {
            if value == 0 {
                return Err(SeedPlanError::ZeroCount { field });
            }
        }
        Ok(Self {
            num_users,
            num_apps,
            num_score_names,
            reinit: false,
        })
    }

    /// Delete all existing users and apps before populating.
    #[must_use]
    pub fn with_reinit(mut self, reinit: bool) -> Self {
        self.reinit = reinit;
        self
    }
}

/// Counts reported after a population run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Users deleted by `reinit`.
    pub users_removed: u64,
    /// Apps deleted by `reinit`.
    pub apps_removed: u64,
    /// Users inserted, fixed user included.
    pub users: u64,
    /// Apps inserted, fixed app included.
    pub apps: u64,
    /// Score entries written.
    pub scores: u64,
}

/// Administrative operations against a [`LeaderboardStore`].
#[derive(Clone)]
pub struct Seeder<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Seeder<S> {
    /// Create a seeder over `store`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

impl<S> Seeder<S>
where
    S: LeaderboardStore,
{
    /// Register an app under a fresh random id.
    pub async fn create_app(&self, name: AppName) -> Result<App, Error> {
        let app = App {
            id: AppId::random(),
            name,
        };
        let inserted = app.clone();
        self.store
            .run(move |session| {
                async move {
                    session.insert_app(&inserted).await?;
                    Ok(())
                }
                .boxed()
            })
            .await?;
        info!(app_id = %app.id, name = %app.name, "registered app");
        Ok(app)
    }

    /// Populate the store according to `plan`, drawing values from `rng`.
    ///
    /// Everything happens in one transaction: a failure leaves the store
    /// untouched.
    pub async fn populate<R>(&self, plan: SeedPlan, rng: R) -> Result<SeedSummary, Error>
    where
        R: Rng + Send + 'static,
    {
        let now = self.clock.utc();
        let summary = self
            .store
            .run(move |session| {
                async move {
                    let mut rng = rng;
                    populate_session(session, plan, &mut rng, now).await
                }
                .boxed()
            })
            .await?;
        info!(
            users = summary.users,
            apps = summary.apps,
            scores = summary.scores,
            "populated leaderboard store"
        );
        Ok(summary)
    }
}

async fn populate_session<R: Rng + Send>(
    session: &mut dyn LeaderboardSession,
    plan: SeedPlan,
    rng: &mut R,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<SeedSummary, Error> {
    let mut summary = SeedSummary::default();
    if plan.reinit {
        summary.users_removed = session.delete_all_users().await?;
        summary.apps_removed = session.delete_all_apps().await?;
    }

    let users = synthetic_users(plan.num_users, now)?;
    for user in &users {
        session.insert_user(user).await?;
    }
    summary.users = users.len() as u64;

    let apps = synthetic_apps(plan.num_apps, rng)?;
    for app in &apps {
        session.insert_app(app).await?;
    }
    summary.apps = apps.len() as u64;

    let names = (0..plan.num_score_names)
        .map(|i| ScoreName::new(format!("score{i}")).map_err(invalid_seed))
        .collect::<Result<Vec<_>, _>>()?;
    for app in &apps {
        for user in &users {
            for name in &names {
                let key = ScoreKey {
                    app_id: app.id,
                    score_name: name.clone(),
                    user_id: user.id.clone(),
                };
                session
                    .upsert_score(&key, rng.gen_range(SCORE_RANGE))
                    .await?;
                summary.scores += 1;
            }
        }
    }
    Ok(summary)
}

fn synthetic_users(count: u32, now: chrono::DateTime<chrono::Utc>) -> Result<Vec<User>, Error> {
    let mut users = (0..count)
        .map(|i| {
            Ok(User {
                id: UserId::new(i.to_string()).map_err(invalid_seed)?,
                nickname: Nickname::new(format!("user_{i}")).map_err(invalid_seed)?,
                created_at: now,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    users.push(User {
        id: UserId::new(TEST_USER_ID).map_err(invalid_seed)?,
        nickname: Nickname::new(TEST_USER_NICKNAME).map_err(invalid_seed)?,
        created_at: now,
    });
    Ok(users)
}

fn synthetic_apps<R: Rng>(count: u32, rng: &mut R) -> Result<Vec<App>, Error> {
    let mut apps = (0..count)
        .map(|i| {
            let id = uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid();
            Ok(App {
                id: AppId::from_uuid(id),
                name: AppName::new(format!("app_{i}")).map_err(invalid_seed)?,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    let fixed = Uuid::parse_str(TEST_APP_ID).map_err(invalid_seed)?;
    apps.push(App {
        id: AppId::from_uuid(fixed),
        name: AppName::new(TEST_APP_NAME).map_err(invalid_seed)?,
    });
    Ok(apps)
}

fn invalid_seed(err: impl std::fmt::Display) -> Error {
    Error::internal(format!("generated seed data failed validation: {err}"))
}
