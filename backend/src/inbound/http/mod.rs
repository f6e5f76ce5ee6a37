//! HTTP inbound adapter exposing the leaderboard REST endpoints.

pub mod error;
pub mod health;
pub mod leaderboard;
pub mod schemas;
pub mod signing;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;

use actix_web::web;

pub use error::ApiResult;
pub use signing::{CHECKSUM_HEADER, Checksum};
pub use state::HttpState;

/// Register every leaderboard route together with the query error handler.
///
/// Health probes are mounted separately so that they stay reachable while
/// the store is not.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(signing::query_config())
        .service(users::register_user)
        .service(users::get_user)
        .service(users::update_nickname)
        .service(users::delete_user)
        .service(leaderboard::user_rank)
        .service(leaderboard::top_scores)
        .service(leaderboard::submit_score)
        .service(leaderboard::delete_score);
}
