//! Request signing plumbing shared by every leaderboard route.
//!
//! The digest travels in the `checksum` header so it never takes part in
//! its own canonical form. Query strings that fail to deserialise are
//! answered with the domain's `invalid_request` payload.

use actix_web::dev::Payload;
use actix_web::error::QueryPayloadError;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::{ChecksumDigest, Error, SignedRequest};

/// Header carrying the request digest.
pub const CHECKSUM_HEADER: &str = "checksum";

/// Digest supplied with the request, if any.
///
/// A header that is not valid UTF-8 can never match a hex digest, so it is
/// kept as an empty digest and rejected as a mismatch rather than as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum(pub Option<ChecksumDigest>);

impl Checksum {
    /// Pair the digest with the operation parameters.
    pub fn sign<T>(self, params: T) -> SignedRequest<T> {
        SignedRequest::new(params, self.0)
    }
}

impl FromRequest for Checksum {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let digest = req.headers().get(CHECKSUM_HEADER).map(|value| {
            value.to_str().map_or_else(
                |_| {
                    debug!("checksum header is not valid UTF-8");
                    ChecksumDigest::new(String::new())
                },
                ChecksumDigest::new,
            )
        });
        ready(Ok(Self(digest)))
    }
}

/// Query extractor configuration mapping parse failures to 400 payloads.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req| {
        let error = Error::invalid_request(format!("invalid query parameters: {err}"));
        actix_web::error::InternalError::from_response(
            err,
            actix_web::ResponseError::error_response(&error),
        )
        .into()
    })
}
