//! Leaderboard domain service.
//!
//! Implements the driving ports. Every operation follows the same shape:
//! verify the checksum over the raw parameters, parse them into domain
//! types, then do all store work inside one [`LeaderboardStore::run`]
//! transaction. A rejected checksum never reaches the store.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt as _;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    DeleteScoreRequest, DeleteUserRequest, GetUserRequest, LeaderboardCommand,
    LeaderboardQuery, LeaderboardSession, LeaderboardStore, RegisterUserRequest, Registered,
    SubmitScoreRequest, TopScoresRequest, UpdateNicknameRequest, UserProfile, UserRankRequest,
};
use crate::domain::{
    AppId, BoardKey, ChecksumAuthenticator, Error, ErrorReason, Nickname, RankEngine, ScoreKey,
    ScoreName, SignedParams, SignedRequest, TopScores, User, UserId, UserRank,
};

/// Leaderboard service implementing [`LeaderboardCommand`] and
/// [`LeaderboardQuery`].
#[derive(Clone)]
pub struct LeaderboardService<S> {
    store: Arc<S>,
    authenticator: ChecksumAuthenticator,
    clock: Arc<dyn Clock>,
    ranks: RankEngine,
}

impl<S> LeaderboardService<S> {
    /// Create a service over `store`, verifying requests with
    /// `authenticator`.
    pub fn new(store: Arc<S>, authenticator: ChecksumAuthenticator, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            authenticator,
            clock,
            ranks: RankEngine,
        }
    }

    fn authenticate<T: SignedParams>(
        &self,
        operation: &'static str,
        request: &SignedRequest<T>,
    ) -> Result<(), Error> {
        self.authenticator.authenticate(request).map_err(|failure| {
            info!(operation, reason = %failure, "rejected request checksum");
            Error::from(failure)
        })
    }
}

/// Malformed app ids can never name a stored app.
fn parse_app_id(raw: &str, missing: ErrorReason) -> Result<AppId, Error> {
    raw.parse().map_err(|_| Error::from(missing))
}

/// Resolve a score key whose parts may have failed to parse.
///
/// Parts that cannot be stored are reported with the same reason, and in
/// the same order, as parts that are simply absent from the store.
async fn resolve_score_key(
    session: &mut dyn LeaderboardSession,
    app_id: AppId,
    score_name: Option<ScoreName>,
    user_id: Option<UserId>,
) -> Result<ScoreKey, Error> {
    if let (Some(score_name), Some(user_id)) = (score_name.clone(), user_id) {
        return Ok(ScoreKey {
            app_id,
            score_name,
            user_id,
        });
    }
    if !session.app_exists(&app_id).await? {
        return Err(ErrorReason::AppNotFound.into());
    }
    let Some(score_name) = score_name else {
        return Err(ErrorReason::ScoreNameNotFound.into());
    };
    if !session
        .distinct_score_names(&app_id)
        .await?
        .contains(&score_name)
    {
        return Err(ErrorReason::ScoreNameNotFound.into());
    }
    Err(ErrorReason::UserNotFound.into())
}

#[async_trait]
impl<S> LeaderboardCommand for LeaderboardService<S>
where
    S: LeaderboardStore,
{
    async fn register_user(
        &self,
        request: SignedRequest<RegisterUserRequest>,
    ) -> Result<Registered, Error> {
        self.authenticate("register_user", &request)?;
        let RegisterUserRequest { user_id, nickname } = request.params;
        let user_id =
            UserId::new(user_id).map_err(|err| Error::invalid_request(err.to_string()))?;
        let nickname = match nickname.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => {
                Nickname::new(raw).map_err(|err| Error::invalid_request(err.to_string()))?
            }
            None => Nickname::placeholder(self.clock.as_ref()),
        };
        let user = User {
            id: user_id,
            nickname,
            created_at: self.clock.utc(),
        };

        let registered = self
            .store
            .run(move |session| {
                async move {
                    session.insert_user(&user).await?;
                    Ok(user)
                }
                .boxed()
            })
            .await?;
        debug!(user_id = %registered.id, "registered user");
        Ok(Registered {
            nickname: registered.nickname,
        })
    }

    async fn update_nickname(
        &self,
        request: SignedRequest<UpdateNicknameRequest>,
    ) -> Result<(), Error> {
        self.authenticate("update_nickname", &request)?;
        let UpdateNicknameRequest { user_id, nickname } = request.params;
        let nickname =
            Nickname::new(nickname).map_err(|err| Error::invalid_request(err.to_string()))?;
        let user_id = UserId::lookup(&user_id).ok_or(ErrorReason::UserNotFound)?;

        self.store
            .run(move |session| {
                async move {
                    if session.rename_user(&user_id, &nickname).await? {
                        debug!(user_id = %user_id, "updated nickname");
                        Ok(())
                    } else {
                        Err(ErrorReason::UserNotFound.into())
                    }
                }
                .boxed()
            })
            .await
    }

    async fn delete_user(&self, request: SignedRequest<DeleteUserRequest>) -> Result<(), Error> {
        self.authenticate("delete_user", &request)?;
        let user_id = UserId::lookup(&request.params.user_id).ok_or(ErrorReason::UserNotFound)?;

        self.store
            .run(move |session| {
                async move {
                    if session.delete_user(&user_id).await? {
                        debug!(user_id = %user_id, "deleted user");
                        Ok(())
                    } else {
                        Err(ErrorReason::UserNotFound.into())
                    }
                }
                .boxed()
            })
            .await
    }

    async fn submit_score(
        &self,
        request: SignedRequest<SubmitScoreRequest>,
    ) -> Result<UserRank, Error> {
        self.authenticate("submit_score", &request)?;
        let SubmitScoreRequest {
            app_id,
            score_name,
            value,
            user_id,
        } = request.params;
        let app_id = parse_app_id(&app_id, ErrorReason::AppNotFound)?;
        let score_name =
            ScoreName::new(score_name).map_err(|err| Error::invalid_request(err.to_string()))?;
        let user_id = UserId::lookup(&user_id).ok_or(ErrorReason::UserNotFound)?;
        let key = ScoreKey {
            app_id,
            score_name,
            user_id,
        };
        let ranks = self.ranks;

        self.store
            .run(move |session| {
                async move {
                    session.upsert_score(&key, value).await?;
                    let rank = ranks.rank(&mut *session, &key).await?;
                    debug!(
                        app_id = %key.app_id,
                        score_name = %key.score_name,
                        user_id = %key.user_id,
                        value,
                        rank = rank.rank,
                        "submitted score"
                    );
                    Ok(rank)
                }
                .boxed()
            })
            .await
    }

    async fn delete_score(&self, request: SignedRequest<DeleteScoreRequest>) -> Result<(), Error> {
        self.authenticate("delete_score", &request)?;
        let DeleteScoreRequest {
            app_id,
            score_name,
            user_id,
        } = request.params;
        let key = match (
            app_id.parse::<AppId>().ok(),
            ScoreName::lookup(&score_name),
            UserId::lookup(&user_id),
        ) {
            (Some(app_id), Some(score_name), Some(user_id)) => ScoreKey {
                app_id,
                score_name,
                user_id,
            },
            _ => return Err(ErrorReason::ScoreNameNotFound.into()),
        };

        self.store
            .run(move |session| {
                async move {
                    if session.delete_score(&key).await? {
                        debug!(user_id = %key.user_id, score_name = %key.score_name, "deleted score");
                        Ok(())
                    } else {
                        Err(ErrorReason::ScoreNameNotFound.into())
                    }
                }
                .boxed()
            })
            .await
    }
}

#[async_trait]
impl<S> LeaderboardQuery for LeaderboardService<S>
where
    S: LeaderboardStore,
{
    async fn get_user(&self, request: SignedRequest<GetUserRequest>) -> Result<UserProfile, Error> {
        self.authenticate("get_user", &request)?;
        let GetUserRequest { app_id, user_id } = request.params;
        let app_id = parse_app_id(&app_id, ErrorReason::AppNotFound)?;
        let user_id = UserId::lookup(&user_id);

        self.store
            .run(move |session| {
                async move {
                    if !session.app_exists(&app_id).await? {
                        return Err(ErrorReason::AppNotFound.into());
                    }
                    let Some(user_id) = user_id else {
                        return Err(ErrorReason::UserNotFound.into());
                    };
                    let user = session
                        .find_user(&user_id)
                        .await?
                        .ok_or(ErrorReason::UserNotFound)?;
                    let scores = session.user_scores(&app_id, &user.id).await?;
                    Ok(UserProfile {
                        id: user.id,
                        nickname: user.nickname,
                        scores,
                    })
                }
                .boxed()
            })
            .await
    }

    async fn user_rank(&self, request: SignedRequest<UserRankRequest>) -> Result<UserRank, Error> {
        self.authenticate("user_rank", &request)?;
        let UserRankRequest {
            app_id,
            score_name,
            user_id,
        } = request.params;
        let app_id = parse_app_id(&app_id, ErrorReason::AppNotFound)?;
        let score_name = ScoreName::lookup(&score_name);
        let user_id = UserId::lookup(&user_id);
        let ranks = self.ranks;

        self.store
            .run(move |session| {
                async move {
                    let key = resolve_score_key(&mut *session, app_id, score_name, user_id).await?;
                    ranks.rank(&mut *session, &key).await
                }
                .boxed()
            })
            .await
    }

    async fn top_scores(&self, request: SignedRequest<TopScoresRequest>) -> Result<TopScores, Error> {
        self.authenticate("top_scores", &request)?;
        let TopScoresRequest {
            app_id,
            user_id,
            score_name,
            k,
        } = request.params;
        let limit = u64::try_from(k)
            .map_err(|_| Error::invalid_request("k must not be negative"))?;
        let app_id = parse_app_id(&app_id, ErrorReason::AppNotFound)?;
        let score_name = ScoreName::lookup(&score_name);
        let user_id = UserId::lookup(&user_id);

        self.store
            .run(move |session| {
                async move {
                    if !session.app_exists(&app_id).await? {
                        return Err(ErrorReason::AppNotFound.into());
                    }
                    let score_name = score_name.ok_or(ErrorReason::ScoreNameNotFound)?;
                    if !session
                        .distinct_score_names(&app_id)
                        .await?
                        .contains(&score_name)
                    {
                        return Err(ErrorReason::ScoreNameNotFound.into());
                    }
                    let board = BoardKey {
                        app_id,
                        score_name,
                    };
                    let scores = session.top_scores(&board, limit).await?;

                    let standing = match user_id {
                        Some(user_id) => {
                            let key = ScoreKey {
                                app_id: board.app_id,
                                score_name: board.score_name,
                                user_id,
                            };
                            session.standing(&key).await?
                        }
                        None => None,
                    };
                    let (user_score, user_rank) = standing.map_or((0, -1), |standing| {
                        let rank = UserRank::from_standing(standing).rank;
                        (standing.value, i64::try_from(rank).unwrap_or(i64::MAX))
                    });
                    Ok(TopScores {
                        scores,
                        user_score,
                        user_rank,
                    })
                }
                .boxed()
            })
            .await
    }
}

#[cfg(test)]
#[path = "leaderboard_service_tests.rs"]
mod tests;
