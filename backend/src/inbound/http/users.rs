//! User registry handlers.
//!
//! ```text
//! POST   /user?userId=u1&nickname=ada        checksum: <hex>
//! GET    /user?appId=<uuid>&userId=u1        checksum: <hex>
//! PUT    /user?userId=u1&nickname=grace      checksum: <hex>
//! DELETE /user?userId=u1                     checksum: <hex>
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    DeleteUserRequest, GetUserRequest, RegisterUserRequest, UpdateNicknameRequest, UserProfile,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::signing::Checksum;
use crate::inbound::http::state::HttpState;

/// Query parameters of `POST /user`.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct RegisterUserQuery {
    /// Requested user id (1 to 30 characters).
    pub user_id: String,
    /// Display name; a placeholder is generated when blank or absent.
    pub nickname: Option<String>,
}

/// Query parameters of `GET /user`.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct GetUserQuery {
    /// App whose scores are listed.
    pub app_id: String,
    pub user_id: String,
}

/// Query parameters of `PUT /user`.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct UpdateNicknameQuery {
    pub user_id: String,
    /// New display name.
    pub nickname: String,
}

/// Query parameters of `DELETE /user`.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct DeleteUserQuery {
    pub user_id: String,
}

/// Body of a successful registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisteredResponse {
    /// Stored nickname, possibly generated.
    #[schema(example = "user_123456")]
    pub nickname: String,
}

/// One score in a user profile.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserScoreResponse {
    #[schema(example = "arcade")]
    pub score_name: String,
    pub value: i32,
}

/// Body of `GET /user`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserProfileResponse {
    pub id: String,
    pub nickname: String,
    /// Every entry the user holds within the requested app.
    pub scores: Vec<UserScoreResponse>,
}

impl From<UserProfile> for UserProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            nickname: profile.nickname.to_string(),
            scores: profile
                .scores
                .into_iter()
                .map(|score| UserScoreResponse {
                    score_name: score.score_name.to_string(),
                    value: score.value,
                })
                .collect(),
        }
    }
}

/// Register a user.
#[utoipa::path(
    post,
    path = "/user",
    params(
        RegisterUserQuery,
        ("checksum" = String, Header, description = "Request digest")
    ),
    responses(
        (status = 201, description = "User registered", body = RegisteredResponse),
        (status = 400, description = "Invalid user id or nickname", body = ErrorSchema),
        (status = 401, description = "Bad checksum or user id already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "registerUser"
)]
#[post("/user")]
pub async fn register_user(
    state: web::Data<HttpState>,
    checksum: Checksum,
    query: web::Query<RegisterUserQuery>,
) -> ApiResult<HttpResponse> {
    let RegisterUserQuery { user_id, nickname } = query.into_inner();
    let registered = state
        .commands
        .register_user(checksum.sign(RegisterUserRequest { user_id, nickname }))
        .await?;
    Ok(HttpResponse::Created().json(RegisteredResponse {
        nickname: registered.nickname.to_string(),
    }))
}

/// Fetch a user with their scores in one app.
#[utoipa::path(
    get,
    path = "/user",
    params(
        GetUserQuery,
        ("checksum" = String, Header, description = "Request digest")
    ),
    responses(
        (status = 200, description = "User profile", body = UserProfileResponse),
        (status = 401, description = "Bad checksum", body = ErrorSchema),
        (status = 404, description = "App or user not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/user")]
pub async fn get_user(
    state: web::Data<HttpState>,
    checksum: Checksum,
    query: web::Query<GetUserQuery>,
) -> ApiResult<web::Json<UserProfileResponse>> {
    let GetUserQuery { app_id, user_id } = query.into_inner();
    let profile = state
        .queries
        .get_user(checksum.sign(GetUserRequest { app_id, user_id }))
        .await?;
    Ok(web::Json(profile.into()))
}

/// Replace a user's nickname.
#[utoipa::path(
    put,
    path = "/user",
    params(
        UpdateNicknameQuery,
        ("checksum" = String, Header, description = "Request digest")
    ),
    responses(
        (status = 200, description = "Nickname updated"),
        (status = 400, description = "Invalid nickname", body = ErrorSchema),
        (status = 401, description = "Bad checksum", body = ErrorSchema),
        (status = 404, description = "User not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateNickname"
)]
#[put("/user")]
pub async fn update_nickname(
    state: web::Data<HttpState>,
    checksum: Checksum,
    query: web::Query<UpdateNicknameQuery>,
) -> ApiResult<HttpResponse> {
    let UpdateNicknameQuery { user_id, nickname } = query.into_inner();
    state
        .commands
        .update_nickname(checksum.sign(UpdateNicknameRequest { user_id, nickname }))
        .await?;
    Ok(HttpResponse::Ok().finish())
}

/// Delete a user and every score they hold.
#[utoipa::path(
    delete,
    path = "/user",
    params(
        DeleteUserQuery,
        ("checksum" = String, Header, description = "Request digest")
    ),
    responses(
        (status = 200, description = "User deleted"),
        (status = 401, description = "Bad checksum", body = ErrorSchema),
        (status = 404, description = "User not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/user")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    checksum: Checksum,
    query: web::Query<DeleteUserQuery>,
) -> ApiResult<HttpResponse> {
    let DeleteUserQuery { user_id } = query.into_inner();
    state
        .commands
        .delete_user(checksum.sign(DeleteUserRequest { user_id }))
        .await?;
    Ok(HttpResponse::Ok().finish())
}
