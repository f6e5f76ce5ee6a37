//! Administrative commands: schema migrations, app registration, and fake
//! data population.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mockable::{DefaultClock, DefaultEnv};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use leaderboard::domain::{AppName, SeedPlan, Seeder};
use leaderboard::outbound::persistence::{
    DbPool, DieselLeaderboardStore, PoolConfig, revert_all, run_pending,
};
use leaderboard::settings::database_url_from_env;

/// `leaderboard-admin` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "leaderboard-admin",
    about = "Manage the leaderboard schema, apps, and sample data",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `LEADERBOARD_DATABASE_URL`,
    /// then `DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply the embedded schema migrations.
    Migrate {
        /// Revert every migration first, dropping all data.
        #[arg(long)]
        recreate: bool,
    },
    /// Register an app and print its generated id.
    CreateApp {
        /// Display name of the app (max 30 characters).
        #[arg(long)]
        name: String,
    },
    /// Fill the store with random users, apps, and scores.
    Populate {
        #[arg(long, default_value_t = 100)]
        num_users: u32,
        #[arg(long, default_value_t = 5)]
        num_apps: u32,
        #[arg(long, default_value_t = 4)]
        num_score_names: u32,
        /// Delete every user and app first.
        #[arg(long)]
        reinit: bool,
        /// Seed for reproducible data.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let database_url = resolve_database_url(args.database_url)?;

    match args.command {
        Command::Migrate { recreate } => migrate(database_url, recreate).await,
        Command::CreateApp { name } => create_app(&database_url, name).await,
        Command::Populate {
            num_users,
            num_apps,
            num_score_names,
            reinit,
            seed,
        } => {
            let plan = SeedPlan::new(num_users, num_apps, num_score_names)
                .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?
                .with_reinit(reinit);
            populate(&database_url, plan, seed).await
        }
    }
}

async fn migrate(database_url: String, recreate: bool) -> io::Result<()> {
    let (reverted, applied) = tokio::task::spawn_blocking(move || {
        let reverted = if recreate {
            revert_all(&database_url)?
        } else {
            0
        };
        run_pending(&database_url).map(|applied| (reverted, applied))
    })
    .await
    .map_err(|error| io::Error::other(format!("migration task failed: {error}")))?
    .map_err(io::Error::other)?;

    println!("reverted={reverted}");
    println!("applied={applied}");
    Ok(())
}

async fn seeder(database_url: &str) -> io::Result<Seeder<DieselLeaderboardStore>> {
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    Ok(Seeder::new(
        Arc::new(DieselLeaderboardStore::new(pool)),
        Arc::new(DefaultClock),
    ))
}

async fn create_app(database_url: &str, name: String) -> io::Result<()> {
    let name =
        AppName::new(name).map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
    let app = seeder(database_url)
        .await?
        .create_app(name)
        .await
        .map_err(|error| io::Error::other(format!("create app failed: {error}")))?;

    println!("app_id={}", app.id);
    println!("name={}", app.name);
    Ok(())
}

async fn populate(database_url: &str, plan: SeedPlan, seed: Option<u64>) -> io::Result<()> {
    let rng = seed.map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64);
    let summary = seeder(database_url)
        .await?
        .populate(plan, rng)
        .await
        .map_err(|error| io::Error::other(format!("populate failed: {error}")))?;

    println!("users_removed={}", summary.users_removed);
    println!("apps_removed={}", summary.apps_removed);
    println!("users={}", summary.users);
    println!("apps={}", summary.apps);
    println!("scores={}", summary.scores);
    Ok(())
}

fn resolve_database_url(explicit: Option<String>) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }
    database_url_from_env(&DefaultEnv::new()).map_err(|error| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{error}: set --database-url or LEADERBOARD_DATABASE_URL"),
        )
    })
}
