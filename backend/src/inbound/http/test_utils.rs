//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::domain::ports::{MockLeaderboardCommand, MockLeaderboardQuery};
use crate::domain::{ChecksumDigest, SignedRequest};
use crate::inbound::http::{CHECKSUM_HEADER, HttpState, configure};

/// Digest sent by handler tests. The mocked ports never verify it.
pub const TEST_DIGEST: &str = "d1g3st";

/// Build an app serving every leaderboard route against mocked ports.
pub fn mocked_app(
    commands: MockLeaderboardCommand,
    queries: MockLeaderboardQuery,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = HttpState::new(Arc::new(commands), Arc::new(queries));
    App::new()
        .app_data(web::Data::new(state))
        .configure(configure)
}

/// Header pair carrying [`TEST_DIGEST`].
pub fn checksum_header() -> (&'static str, &'static str) {
    (CHECKSUM_HEADER, TEST_DIGEST)
}

/// True when the request forwarded the test digest untouched.
pub fn carries_test_digest<T>(request: &SignedRequest<T>) -> bool {
    request.digest == Some(ChecksumDigest::new(TEST_DIGEST))
}
