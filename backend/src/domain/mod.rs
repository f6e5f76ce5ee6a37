//! Domain primitives, services, and ports.
//!
//! Purpose: define the strongly typed leaderboard entities and the service
//! that orchestrates authentication, existence checks, store access, and
//! ranking. Nothing in here knows about HTTP or SQL.
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic failure payload.
//! - ChecksumAuthenticator: request signing and verification.
//! - RankEngine: rank and percentile within a board.
//! - LeaderboardService: the driving-port implementation.

pub mod app;
pub mod checksum;
pub mod error;
mod leaderboard_service;
pub mod ports;
pub mod rank;
pub mod score;
pub mod seeding;
pub mod trace_id;
pub mod user;

pub use self::app::{App, AppId, AppName, AppValidationError};
pub use self::checksum::{
    AuthFailure, ChecksumAuthenticator, ChecksumDigest, ParamSet, SharedSecret,
    SharedSecretError, SignedParams, SignedRequest,
};
pub use self::error::{Error, ErrorCode, ErrorReason, ErrorValidationError};
pub use self::leaderboard_service::LeaderboardService;
pub use self::rank::{RankEngine, Standing, TopScores, UserRank};
pub use self::score::{
    BoardEntry, BoardKey, ScoreKey, ScoreName, ScoreNameValidationError, UserScore,
};
pub use self::seeding::{SeedPlan, SeedPlanError, SeedSummary, Seeder, TEST_APP_ID};
pub use self::trace_id::TraceId;
pub use self::user::{Nickname, User, UserId, UserValidationError};

/// HTTP header name used to propagate trace identifiers.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Convenient result alias for domain operations.
///
/// # Examples
/// ```
/// use leaderboard::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<()> {
///     Err(Error::not_found("missing"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
