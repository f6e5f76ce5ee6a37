//! PostgreSQL persistence for the leaderboard store.
//!
//! The adapter is thin: it translates between Diesel rows and domain types
//! and maps driver failures into [`LeaderboardStoreError`] values. Row
//! structs (`models.rs`) and table definitions (`schema.rs`) stay private to
//! this module.
//!
//! # Example
//!
//! ```ignore
//! use leaderboard::outbound::persistence::{DbPool, DieselLeaderboardStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/leaderboard")).await?;
//! let store = DieselLeaderboardStore::new(pool);
//! ```
//!
//! [`LeaderboardStoreError`]: crate::domain::ports::LeaderboardStoreError

mod diesel_leaderboard_store;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_leaderboard_store::DieselLeaderboardStore;
pub use migrations::{MIGRATIONS, MigrationError, revert_all, run_pending};
pub use pool::{DEFAULT_CHECKOUT_TIMEOUT, DEFAULT_MAX_SIZE, DbPool, PoolConfig, PoolError};
