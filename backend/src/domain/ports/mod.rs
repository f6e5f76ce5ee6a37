//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports ([`LeaderboardCommand`], [`LeaderboardQuery`]) are what
//! inbound adapters call. The driven port ([`LeaderboardStore`]) is what the
//! persistence adapters implement.

mod macros;
pub(crate) use macros::define_port_error;

mod leaderboard_command;
mod leaderboard_query;
mod leaderboard_store;

#[cfg(test)]
pub use leaderboard_command::MockLeaderboardCommand;
pub use leaderboard_command::{
    DeleteScoreRequest, DeleteUserRequest, LeaderboardCommand, RegisterUserRequest, Registered,
    SubmitScoreRequest, UpdateNicknameRequest,
};
#[cfg(test)]
pub use leaderboard_query::MockLeaderboardQuery;
pub use leaderboard_query::{
    GetUserRequest, LeaderboardQuery, TopScoresRequest, UserProfile, UserRankRequest,
};
pub use leaderboard_store::{
    AppRegistry, LeaderboardSession, LeaderboardStore, LeaderboardStoreError, ScoreStore,
    SessionFuture, UserRegistry,
};
