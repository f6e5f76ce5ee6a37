//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{LeaderboardCommand, LeaderboardQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Mutating leaderboard operations.
    pub commands: Arc<dyn LeaderboardCommand>,
    /// Read-only leaderboard operations.
    pub queries: Arc<dyn LeaderboardQuery>,
}

impl HttpState {
    /// Bundle the two driving ports.
    pub fn new(commands: Arc<dyn LeaderboardCommand>, queries: Arc<dyn LeaderboardQuery>) -> Self {
        Self { commands, queries }
    }
}
