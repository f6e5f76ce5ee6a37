//! Signed request helpers for the leaderboard HTTP integration suites.
//!
//! Builds the real service over the in-memory store, so requests travel the
//! whole path from checksum extraction to ranking.

use std::fmt;
use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::Method;
use actix_web::test::TestRequest;
use actix_web::{App as ActixApp, web};

use leaderboard::Trace;
use leaderboard::domain::{
    App, AppId, AppName, ChecksumAuthenticator, LeaderboardService, ParamSet, SharedSecret,
};
use leaderboard::inbound::http::{CHECKSUM_HEADER, HttpState, configure};
use leaderboard::test_support::{FixtureClock, InMemoryLeaderboardStore};

pub(crate) const SECRET: &str = "integration-secret";

/// One request: the query string and the parameters its digest covers.
pub(crate) struct SignedCall {
    method: Method,
    path: &'static str,
    params: ParamSet,
    query: Vec<(String, String)>,
}

impl SignedCall {
    pub(crate) fn new(method: Method, path: &'static str) -> Self {
        Self {
            method,
            path,
            params: ParamSet::new(),
            query: Vec::new(),
        }
    }

    /// Send `name=value` and sign it.
    pub(crate) fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        self.params = self.params.with(name, &value);
        self.query.push((name.to_owned(), value));
        self
    }

    /// Sign `name` as absent without sending it.
    pub(crate) fn absent(mut self, name: &str) -> Self {
        self.params = self.params.with_optional(name, None::<&str>);
        self
    }

    fn uri(&self) -> String {
        let query = self
            .query
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.path)
    }
}

/// In-memory backed service with one registered app.
#[derive(Debug, Clone)]
pub(crate) struct Harness {
    pub(crate) store: InMemoryLeaderboardStore,
    pub(crate) authenticator: ChecksumAuthenticator,
    pub(crate) app_id: AppId,
}

impl Harness {
    pub(crate) async fn new() -> Self {
        let store = InMemoryLeaderboardStore::default();
        let app_id = AppId::random();
        store
            .seed_app(App {
                id: app_id,
                name: AppName::new("Arcade").expect("app name"),
            })
            .await;
        let authenticator =
            ChecksumAuthenticator::new(SharedSecret::new(SECRET).expect("shared secret"));
        Self {
            store,
            authenticator,
            app_id,
        }
    }

    pub(crate) fn app(
        &self,
    ) -> ActixApp<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let service = Arc::new(LeaderboardService::new(
            Arc::new(self.store.clone()),
            self.authenticator.clone(),
            Arc::new(FixtureClock::default()),
        ));
        ActixApp::new()
            .app_data(web::Data::new(HttpState::new(service.clone(), service)))
            .wrap(Trace)
            .configure(configure)
    }

    /// Request carrying the correct digest.
    pub(crate) fn signed(&self, call: SignedCall) -> TestRequest {
        let digest = self.authenticator.compute(&call.params);
        self.unsigned(call)
            .insert_header((CHECKSUM_HEADER, digest.to_string()))
    }

    /// Request without a checksum header.
    pub(crate) fn unsigned(&self, call: SignedCall) -> TestRequest {
        TestRequest::default()
            .method(call.method.clone())
            .uri(&call.uri())
    }
}

pub(crate) fn register(user_id: &str, nickname: Option<&str>) -> SignedCall {
    let call = SignedCall::new(Method::POST, "/user").param("userId", user_id);
    match nickname {
        Some(nickname) => call.param("nickname", nickname),
        None => call.absent("nickname"),
    }
}

pub(crate) fn submit(app_id: &AppId, score_name: &str, user_id: &str, value: i32) -> SignedCall {
    SignedCall::new(Method::POST, "/leaderboard")
        .param("appId", app_id)
        .param("scoreName", score_name)
        .param("value", value)
        .param("userId", user_id)
}

pub(crate) fn rank(app_id: &AppId, score_name: &str, user_id: &str) -> SignedCall {
    SignedCall::new(Method::GET, "/user/rank")
        .param("appId", app_id)
        .param("scoreName", score_name)
        .param("userId", user_id)
}

pub(crate) fn top(app_id: &AppId, score_name: &str, user_id: &str, k: i64) -> SignedCall {
    SignedCall::new(Method::GET, "/leaderboard/top")
        .param("appId", app_id)
        .param("userId", user_id)
        .param("scoreName", score_name)
        .param("k", k)
}
