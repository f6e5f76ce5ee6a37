//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every leaderboard route, the health probes, the
//! adapter-layer schemas, and the `checksum` header security scheme. The
//! document is served by Swagger UI in debug builds and printed by the
//! `openapi-dump` binary.

use crate::inbound::http::CHECKSUM_HEADER;
use crate::inbound::http::leaderboard::{RankResponse, TopScoreEntry, TopScoresResponse};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorReasonSchema, ErrorSchema};
use crate::inbound::http::users::{RegisteredResponse, UserProfileResponse, UserScoreResponse};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Adds the request digest header as an API key scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "Checksum",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                CHECKSUM_HEADER,
                "Hex SHA-256 of the request parameters followed by the shared secret.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Leaderboard API",
        description = "Multi-tenant score boards with checksum-signed requests."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("Checksum" = [])),
    paths(
        crate::inbound::http::users::register_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_nickname,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::leaderboard::user_rank,
        crate::inbound::http::leaderboard::submit_score,
        crate::inbound::http::leaderboard::delete_score,
        crate::inbound::http::leaderboard::top_scores,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        ErrorReasonSchema,
        RegisteredResponse,
        UserProfileResponse,
        UserScoreResponse,
        RankResponse,
        TopScoresResponse,
        TopScoreEntry
    )),
    tags(
        (name = "users", description = "User registry"),
        (name = "leaderboard", description = "Scores and rankings"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
