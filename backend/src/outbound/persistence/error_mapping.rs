//! Mapping from pool and Diesel failures to [`LeaderboardStoreError`].

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::LeaderboardStoreError;

use super::pool::PoolError;

/// Pool failures mean no connection could be obtained.
pub(super) fn map_pool_error(error: PoolError) -> LeaderboardStoreError {
    debug!(%error, "leaderboard store checkout failed");
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    LeaderboardStoreError::connection(message)
}

/// Map Diesel failures into connection or query errors.
///
/// Driver detail is logged at `debug` and kept out of the returned message.
pub(super) fn map_diesel_error(error: DieselError) -> LeaderboardStoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "leaderboard diesel operation failed");
        }
        _ => debug!(%error, "leaderboard diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            LeaderboardStoreError::connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            LeaderboardStoreError::query("referenced user or app does not exist")
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            LeaderboardStoreError::query("unique constraint violated")
        }
        DieselError::NotFound => LeaderboardStoreError::query("record not found"),
        DieselError::QueryBuilderError(_) => LeaderboardStoreError::query("database query error"),
        _ => LeaderboardStoreError::query("database error"),
    }
}

/// Like [`map_diesel_error`], but reads a unique violation as a taken user id.
pub(super) fn map_user_insert_error(error: DieselError, user_id: &str) -> LeaderboardStoreError {
    if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) = &error {
        debug!(user_id, "user id already registered");
        return LeaderboardStoreError::duplicate_user(user_id);
    }
    map_diesel_error(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_failures_are_connection_errors() {
        let error = map_pool_error(PoolError::checkout("timed out waiting for connection"));
        assert_eq!(
            error,
            LeaderboardStoreError::connection("timed out waiting for connection")
        );
    }

    #[rstest]
    fn missing_rows_are_query_errors() {
        assert_eq!(
            map_diesel_error(DieselError::NotFound),
            LeaderboardStoreError::query("record not found")
        );
    }

    #[rstest]
    fn user_insert_passes_other_failures_through() {
        assert_eq!(
            map_user_insert_error(DieselError::RollbackTransaction, "u1"),
            LeaderboardStoreError::query("database error")
        );
    }
}
