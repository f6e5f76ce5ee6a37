//! Environment-driven service settings.
//!
//! Settings are read through [`mockable::Env`] so they can be validated in
//! isolation. Every failure names the offending variable.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use mockable::Env;

use crate::domain::SharedSecret;
use crate::outbound::persistence::{DEFAULT_CHECKOUT_TIMEOUT, DEFAULT_MAX_SIZE, PoolConfig};

pub const APP_SECRET_ENV: &str = "LEADERBOARD_APP_SECRET";
pub const DATABASE_URL_ENV: &str = "LEADERBOARD_DATABASE_URL";
/// Conventional fallback honoured by the diesel CLI as well.
pub const DATABASE_URL_FALLBACK_ENV: &str = "DATABASE_URL";
pub const BIND_ADDR_ENV: &str = "LEADERBOARD_BIND_ADDR";
pub const POOL_MAX_SIZE_ENV: &str = "LEADERBOARD_POOL_MAX_SIZE";
pub const POOL_CHECKOUT_TIMEOUT_ENV: &str = "LEADERBOARD_POOL_CHECKOUT_TIMEOUT_MS";

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);
const SOCKET_EXPECTED: &str = "host:port, e.g. 0.0.0.0:8080";
const POSITIVE_INT_EXPECTED: &str = "a positive integer";
const MILLIS_EXPECTED: &str = "a whole number of milliseconds";

/// Errors raised while reading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A required environment variable is missing or blank.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Settings for the `leaderboard` server.
#[derive(Debug, Clone)]
pub struct LeaderboardSettings {
    /// Secret shared with clients for request checksums.
    pub secret: SharedSecret,
    /// Store connection pool settings.
    pub pool: PoolConfig,
    /// Listen address.
    pub bind_addr: SocketAddr,
}

impl LeaderboardSettings {
    /// Read every server setting from `env`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use leaderboard::settings::LeaderboardSettings;
    /// use mockable::MockEnv;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|name| match name {
    ///     "LEADERBOARD_APP_SECRET" => Some("s3cret".to_owned()),
    ///     "LEADERBOARD_DATABASE_URL" => Some("postgres://localhost/leaderboard".to_owned()),
    ///     _ => None,
    /// });
    ///
    /// let settings = LeaderboardSettings::from_env(&env).expect("valid settings");
    /// assert_eq!(settings.bind_addr.port(), 8080);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the secret or database URL is missing,
    /// or when a numeric or socket value does not parse.
    pub fn from_env<E: Env>(env: &E) -> Result<Self, SettingsError> {
        let secret = secret_from_env(env)?;
        let database_url = database_url_from_env(env)?;
        let bind_addr = parse_or_default(env, BIND_ADDR_ENV, SOCKET_EXPECTED, DEFAULT_BIND_ADDR)?;
        let max_size =
            parse_or_default(env, POOL_MAX_SIZE_ENV, POSITIVE_INT_EXPECTED, DEFAULT_MAX_SIZE)?;
        if max_size == 0 {
            return Err(SettingsError::InvalidEnv {
                name: POOL_MAX_SIZE_ENV,
                value: max_size.to_string(),
                expected: POSITIVE_INT_EXPECTED,
            });
        }
        let checkout_ms: u64 = parse_or_default(
            env,
            POOL_CHECKOUT_TIMEOUT_ENV,
            MILLIS_EXPECTED,
            u64::try_from(DEFAULT_CHECKOUT_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
        )?;

        Ok(Self {
            secret,
            pool: PoolConfig::new(database_url)
                .with_max_size(max_size)
                .with_checkout_timeout(Duration::from_millis(checkout_ms)),
            bind_addr,
        })
    }
}

/// Read the shared secret; blank counts as missing.
///
/// # Errors
///
/// Returns [`SettingsError::MissingEnv`] when the secret is absent or blank.
pub fn secret_from_env<E: Env>(env: &E) -> Result<SharedSecret, SettingsError> {
    let raw = env
        .string(APP_SECRET_ENV)
        .ok_or(SettingsError::MissingEnv {
            name: APP_SECRET_ENV,
        })?;
    SharedSecret::new(raw).map_err(|_| SettingsError::MissingEnv {
        name: APP_SECRET_ENV,
    })
}

/// Read the database URL, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns [`SettingsError::MissingEnv`] when neither variable is set.
pub fn database_url_from_env<E: Env>(env: &E) -> Result<String, SettingsError> {
    [DATABASE_URL_ENV, DATABASE_URL_FALLBACK_ENV]
        .into_iter()
        .filter_map(|name| env.string(name))
        .find(|value| !value.trim().is_empty())
        .ok_or(SettingsError::MissingEnv {
            name: DATABASE_URL_ENV,
        })
}

fn parse_or_default<E, T>(
    env: &E,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, SettingsError>
where
    E: Env,
    T: std::str::FromStr,
{
    match env.string(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| SettingsError::InvalidEnv {
                name,
                value,
                expected,
            }),
    }
}
