//! Backend entry-point: wires the leaderboard REST endpoints and OpenAPI docs.

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use leaderboard::inbound::http::health::HealthState;
use leaderboard::outbound::persistence::DbPool;
use leaderboard::settings::LeaderboardSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = LeaderboardSettings::from_env(&DefaultEnv::new())
        .map_err(|e| std::io::Error::other(format!("invalid configuration: {e}")))?;
    let pool = DbPool::new(settings.pool.clone())
        .await
        .map_err(|e| std::io::Error::other(format!("database pool: {e}")))?;

    let config = ServerConfig::new(settings.secret, settings.bind_addr, pool);
    info!(bind_addr = %config.bind_addr(), "starting leaderboard server");

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}
