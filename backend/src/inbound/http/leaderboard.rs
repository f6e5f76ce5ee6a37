//! Score submission and ranking handlers.
//!
//! ```text
//! POST   /leaderboard?appId=..&scoreName=arcade&value=120&userId=u1
//! DELETE /leaderboard?appId=..&scoreName=arcade&userId=u1
//! GET    /user/rank?appId=..&scoreName=arcade&userId=u1
//! GET    /leaderboard/top?appId=..&userId=u1&scoreName=arcade&k=10
//! ```
//!
//! Every route expects the digest in the `checksum` header.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    DeleteScoreRequest, SubmitScoreRequest, TopScoresRequest, UserRankRequest,
};
use crate::domain::{TopScores, UserRank};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::signing::Checksum;
use crate::inbound::http::state::HttpState;

/// Query parameters addressing one board entry.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ScoreEntryQuery {
    pub app_id: String,
    /// Board within the app.
    pub score_name: String,
    pub user_id: String,
}

/// Query parameters of `POST /leaderboard`.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct SubmitScoreQuery {
    pub app_id: String,
    pub score_name: String,
    /// New value; replaces any earlier one.
    pub value: i32,
    pub user_id: String,
}

/// Query parameters of `GET /leaderboard/top`.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct TopScoresQuery {
    pub app_id: String,
    /// Requesting user, whose own standing is reported alongside.
    pub user_id: String,
    pub score_name: String,
    /// Maximum number of entries; must not be negative.
    pub k: i64,
}

/// Rank and percentile of one entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RankResponse {
    /// Share of the other entries strictly below this one, 0 to 100.
    #[schema(example = 66)]
    pub percentile: u8,
    /// 1 for the best entry; ties share a rank.
    #[schema(example = 2)]
    pub rank: u64,
}

impl From<UserRank> for RankResponse {
    fn from(value: UserRank) -> Self {
        Self {
            percentile: value.percentile,
            rank: value.rank,
        }
    }
}

/// One row of a top-k listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TopScoreEntry {
    pub nickname: String,
    pub value: i32,
}

/// Body of `GET /leaderboard/top`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopScoresResponse {
    /// Best entries first.
    pub scores: Vec<TopScoreEntry>,
    /// Requesting user's value, or 0 without an entry.
    pub user_score: i32,
    /// Requesting user's rank, or -1 without an entry.
    pub user_rank: i64,
}

impl From<TopScores> for TopScoresResponse {
    fn from(value: TopScores) -> Self {
        Self {
            scores: value
                .scores
                .into_iter()
                .map(|entry| TopScoreEntry {
                    nickname: entry.nickname.to_string(),
                    value: entry.value,
                })
                .collect(),
            user_score: value.user_score,
            user_rank: value.user_rank,
        }
    }
}

/// Rank and percentile of a user's entry.
#[utoipa::path(
    get,
    path = "/user/rank",
    params(
        ScoreEntryQuery,
        ("checksum" = String, Header, description = "Request digest")
    ),
    responses(
        (status = 200, description = "Current standing", body = RankResponse),
        (status = 401, description = "Bad checksum", body = ErrorSchema),
        (status = 404, description = "App, user, or score name not found", body = ErrorSchema)
    ),
    tags = ["leaderboard"],
    operation_id = "userRank"
)]
#[get("/user/rank")]
pub async fn user_rank(
    state: web::Data<HttpState>,
    checksum: Checksum,
    query: web::Query<ScoreEntryQuery>,
) -> ApiResult<web::Json<RankResponse>> {
    let ScoreEntryQuery {
        app_id,
        score_name,
        user_id,
    } = query.into_inner();
    let rank = state
        .queries
        .user_rank(checksum.sign(UserRankRequest {
            app_id,
            score_name,
            user_id,
        }))
        .await?;
    Ok(web::Json(rank.into()))
}

/// Submit a score, replacing any earlier value for the same entry.
#[utoipa::path(
    post,
    path = "/leaderboard",
    params(
        SubmitScoreQuery,
        ("checksum" = String, Header, description = "Request digest")
    ),
    responses(
        (status = 200, description = "Standing after the submission", body = RankResponse),
        (status = 400, description = "Invalid score name or value", body = ErrorSchema),
        (status = 401, description = "Bad checksum", body = ErrorSchema),
        (status = 404, description = "App id is not a UUID or user id could never be stored", body = ErrorSchema),
        (status = 500, description = "Well-formed app or user id that is not registered, or internal server error", body = ErrorSchema)
    ),
    tags = ["leaderboard"],
    operation_id = "submitScore"
)]
#[post("/leaderboard")]
pub async fn submit_score(
    state: web::Data<HttpState>,
    checksum: Checksum,
    query: web::Query<SubmitScoreQuery>,
) -> ApiResult<web::Json<RankResponse>> {
    let SubmitScoreQuery {
        app_id,
        score_name,
        value,
        user_id,
    } = query.into_inner();
    let rank = state
        .commands
        .submit_score(checksum.sign(SubmitScoreRequest {
            app_id,
            score_name,
            value,
            user_id,
        }))
        .await?;
    Ok(web::Json(rank.into()))
}

/// Remove one entry from a board.
#[utoipa::path(
    delete,
    path = "/leaderboard",
    params(
        ScoreEntryQuery,
        ("checksum" = String, Header, description = "Request digest")
    ),
    responses(
        (status = 200, description = "Entry removed"),
        (status = 401, description = "Bad checksum", body = ErrorSchema),
        (status = 404, description = "No such entry", body = ErrorSchema)
    ),
    tags = ["leaderboard"],
    operation_id = "deleteScore"
)]
#[delete("/leaderboard")]
pub async fn delete_score(
    state: web::Data<HttpState>,
    checksum: Checksum,
    query: web::Query<ScoreEntryQuery>,
) -> ApiResult<HttpResponse> {
    let ScoreEntryQuery {
        app_id,
        score_name,
        user_id,
    } = query.into_inner();
    state
        .commands
        .delete_score(checksum.sign(DeleteScoreRequest {
            app_id,
            score_name,
            user_id,
        }))
        .await?;
    Ok(HttpResponse::Ok().finish())
}

/// Best `k` entries of a board plus the requesting user's standing.
#[utoipa::path(
    get,
    path = "/leaderboard/top",
    params(
        TopScoresQuery,
        ("checksum" = String, Header, description = "Request digest")
    ),
    responses(
        (status = 200, description = "Top entries", body = TopScoresResponse),
        (status = 400, description = "Negative k", body = ErrorSchema),
        (status = 401, description = "Bad checksum", body = ErrorSchema),
        (status = 404, description = "App or score name not found", body = ErrorSchema)
    ),
    tags = ["leaderboard"],
    operation_id = "topScores"
)]
#[get("/leaderboard/top")]
pub async fn top_scores(
    state: web::Data<HttpState>,
    checksum: Checksum,
    query: web::Query<TopScoresQuery>,
) -> ApiResult<web::Json<TopScoresResponse>> {
    let TopScoresQuery {
        app_id,
        user_id,
        score_name,
        k,
    } = query.into_inner();
    let top = state
        .queries
        .top_scores(checksum.sign(TopScoresRequest {
            app_id,
            user_id,
            score_name,
            k,
        }))
        .await?;
    Ok(web::Json(top.into()))
}
