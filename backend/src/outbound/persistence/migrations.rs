//! Embedded schema migrations for the leaderboard tables.
//!
//! Diesel's migration harness needs a synchronous connection, so these
//! helpers block. Async callers run them on `spawn_blocking`.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use thiserror::Error;
use tracing::info;

/// Migrations compiled in from `backend/migrations`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Failures while applying or reverting migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The database could not be reached.
    #[error("failed to connect for migrations: {message}")]
    Connect { message: String },
    /// A migration failed to apply or revert.
    #[error("migration failed: {message}")]
    Apply { message: String },
}

fn connect(database_url: &str) -> Result<PgConnection, MigrationError> {
    PgConnection::establish(database_url).map_err(|err| MigrationError::Connect {
        message: err.to_string(),
    })
}

/// Apply every pending migration and return how many ran.
///
/// # Errors
///
/// Returns [`MigrationError`] when the connection or a migration fails.
pub fn run_pending(database_url: &str) -> Result<usize, MigrationError> {
    let mut conn = connect(database_url)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply {
            message: err.to_string(),
        })?;
    info!(count = applied.len(), "applied pending migrations");
    Ok(applied.len())
}

/// Revert every applied migration, dropping the leaderboard tables.
///
/// # Errors
///
/// Returns [`MigrationError`] when the connection or a revert fails.
pub fn revert_all(database_url: &str) -> Result<usize, MigrationError> {
    let mut conn = connect(database_url)?;
    let reverted = conn
        .revert_all_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply {
            message: err.to_string(),
        })?;
    info!(count = reverted.len(), "reverted migrations");
    Ok(reverted.len())
}
