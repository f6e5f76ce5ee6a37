//! HTTP server configuration object.

use std::net::SocketAddr;
use std::sync::Arc;

use leaderboard::domain::SharedSecret;
use leaderboard::outbound::persistence::DbPool;
use mockable::{Clock, DefaultClock};

/// Everything the server needs besides the health state.
pub struct ServerConfig {
    pub(crate) secret: SharedSecret,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) clock: Arc<dyn Clock>,
}

impl ServerConfig {
    /// Construct a configuration that reads the wall clock.
    #[must_use]
    pub fn new(secret: SharedSecret, bind_addr: SocketAddr, db_pool: DbPool) -> Self {
        Self {
            secret,
            bind_addr,
            db_pool,
            clock: Arc::new(DefaultClock),
        }
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
