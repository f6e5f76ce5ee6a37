//! Tests for the leaderboard service.

use std::sync::Arc;

use super::*;
use crate::domain::{
    App, AppName, ChecksumDigest, ErrorCode, SharedSecret, TopScores, UserScore,
};
use crate::test_support::{FixtureClock, InMemoryLeaderboardStore};
use rstest::{fixture, rstest};
use rstest_bdd_macros::{given, then, when};

const SECRET: &str = "leaderboard-test-secret";
const APP: &str = "b3edf18d-7856-48ad-bc46-ea65043c97d9";
const UNKNOWN_APP: &str = "00000000-0000-4000-8000-000000000000";

fn authenticator() -> ChecksumAuthenticator {
    ChecksumAuthenticator::new(SharedSecret::new(SECRET).expect("secret"))
}

fn signed<T: SignedParams>(params: T) -> SignedRequest<T> {
    let digest = authenticator().compute(&params.param_set());
    SignedRequest::new(params, Some(digest))
}

struct Harness {
    store: Arc<InMemoryLeaderboardStore>,
    service: LeaderboardService<InMemoryLeaderboardStore>,
}

impl Harness {
    async fn register(&self, user_id: &str, nickname: Option<&str>) -> Result<Registered, Error> {
        self.service
            .register_user(signed(RegisterUserRequest {
                user_id: user_id.to_owned(),
                nickname: nickname.map(str::to_owned),
            }))
            .await
    }

    async fn submit(&self, user_id: &str, score_name: &str, value: i32) -> Result<UserRank, Error> {
        self.service
            .submit_score(signed(SubmitScoreRequest {
                app_id: APP.to_owned(),
                score_name: score_name.to_owned(),
                value,
                user_id: user_id.to_owned(),
            }))
            .await
    }

    async fn rank(&self, app_id: &str, score_name: &str, user_id: &str) -> Result<UserRank, Error> {
        self.service
            .user_rank(signed(UserRankRequest {
                app_id: app_id.to_owned(),
                score_name: score_name.to_owned(),
                user_id: user_id.to_owned(),
            }))
            .await
    }

    async fn top(&self, user_id: &str, score_name: &str, k: i64) -> Result<TopScores, Error> {
        self.service
            .top_scores(signed(TopScoresRequest {
                app_id: APP.to_owned(),
                user_id: user_id.to_owned(),
                score_name: score_name.to_owned(),
                k,
            }))
            .await
    }

    async fn profile(&self, app_id: &str, user_id: &str) -> Result<UserProfile, Error> {
        self.service
            .get_user(signed(GetUserRequest {
                app_id: app_id.to_owned(),
                user_id: user_id.to_owned(),
            }))
            .await
    }
}

#[fixture]
async fn harness() -> Harness {
    let store = Arc::new(InMemoryLeaderboardStore::default());
    store
        .seed_app(App {
            id: APP.parse().expect("app id"),
            name: AppName::new("testapp").expect("app name"),
        })
        .await;
    let service = LeaderboardService::new(
        Arc::clone(&store),
        authenticator(),
        Arc::new(FixtureClock::default()),
    );
    Harness { store, service }
}

fn reason(result: Result<impl std::fmt::Debug, Error>) -> Option<ErrorReason> {
    result.expect_err("operation should fail").reason()
}

#[rstest]
#[tokio::test]
async fn registration_without_nickname_uses_placeholder(#[future] harness: Harness) {
    let harness = harness.await;
    let registered = harness.register("u1", None).await.expect("register");
    assert_eq!(registered.nickname.as_ref(), "user_123456");
}

#[rstest]
#[tokio::test]
async fn registration_with_blank_nickname_uses_placeholder(#[future] harness: Harness) {
    let harness = harness.await;
    let registered = harness.register("u1", Some("")).await.expect("register");
    assert_eq!(registered.nickname.as_ref(), "user_123456");
}

#[rstest]
#[tokio::test]
async fn registering_twice_is_rejected(#[future] harness: Harness) {
    let harness = harness.await;
    harness.register("u1", Some("Ada")).await.expect("first");

    let error = harness
        .register("u1", Some("Grace"))
        .await
        .expect_err("duplicate");
    assert_eq!(error.reason(), Some(ErrorReason::AlreadyRegistered));
    assert_eq!(error.code(), ErrorCode::Conflict);
    let stored = harness
        .store
        .user(&UserId::new("u1").expect("id"))
        .await
        .expect("user kept");
    assert_eq!(stored.nickname.as_ref(), "Ada");
}

#[rstest]
#[case(String::new())]
#[case("x".repeat(31))]
#[tokio::test]
async fn registration_rejects_unstorable_ids(#[future] harness: Harness, #[case] user_id: String) {
    let harness = harness.await;
    let error = harness.register(&user_id, None).await.expect_err("invalid id");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn rejected_checksums_never_touch_the_store(#[future] harness: Harness) {
    let harness = harness.await;
    let unsigned = SignedRequest::new(
        RegisterUserRequest {
            user_id: "u1".to_owned(),
            nickname: None,
        },
        None,
    );
    let forged = SignedRequest::new(
        RegisterUserRequest {
            user_id: "u1".to_owned(),
            nickname: None,
        },
        Some(ChecksumDigest::new("0".repeat(64))),
    );

    let no_digest = harness.service.register_user(unsigned).await;
    let mismatch = harness.service.register_user(forged).await;

    assert_eq!(reason(no_digest), Some(ErrorReason::NoDigest));
    assert_eq!(reason(mismatch), Some(ErrorReason::Mismatch));
    assert_eq!(harness.store.user_count().await, 0);
}

#[rstest]
#[tokio::test]
async fn tampered_parameters_fail_verification(#[future] harness: Harness) {
    let harness = harness.await;
    harness.register("u1", None).await.expect("register");
    let mut request = signed(SubmitScoreRequest {
        app_id: APP.to_owned(),
        score_name: "arcade".to_owned(),
        value: 10,
        user_id: "u1".to_owned(),
    });
    request.params.value = 10_000;

    let result = harness.service.submit_score(request).await;
    assert_eq!(reason(result), Some(ErrorReason::Mismatch));
    assert_eq!(harness.store.score_count().await, 0);
}

#[rstest]
#[tokio::test]
async fn single_entrant_is_top_of_the_board(#[future] harness: Harness) {
    let harness = harness.await;
    harness.register("u1", None).await.expect("register");

    let rank = harness.submit("u1", "arcade", 100).await.expect("submit");
    assert_eq!(
        rank,
        UserRank {
            rank: 1,
            percentile: 100
        }
    );
}

#[rstest]
#[tokio::test]
async fn ranks_follow_floor_division(#[future] harness: Harness) {
    let harness = harness.await;
    for user in ["u1", "u2", "u3"] {
        harness.register(user, None).await.expect("register");
    }
    harness.submit("u1", "arcade", 120).await.expect("u1");
    harness.submit("u2", "arcade", 80).await.expect("u2");
    harness.submit("u3", "arcade", 80).await.expect("u3");

    let top = harness.rank(APP, "arcade", "u1").await.expect("u1 rank");
    let tied_a = harness.rank(APP, "arcade", "u2").await.expect("u2 rank");
    let tied_b = harness.rank(APP, "arcade", "u3").await.expect("u3 rank");

    assert_eq!(top, UserRank { rank: 1, percentile: 100 });
    assert_eq!(tied_a, UserRank { rank: 3, percentile: 0 });
    assert_eq!(tied_a, tied_b);
}

#[rstest]
#[tokio::test]
async fn resubmission_replaces_the_value(#[future] harness: Harness) {
    let harness = harness.await;
    harness.register("u1", None).await.expect("u1");
    harness.register("u2", None).await.expect("u2");
    harness.submit("u2", "arcade", 50).await.expect("u2");

    let first = harness.submit("u1", "arcade", 10).await.expect("first");
    let second = harness.submit("u1", "arcade", 90).await.expect("second");

    assert_eq!(first.rank, 2);
    assert_eq!(second.rank, 1);
    assert_eq!(harness.store.score_count().await, 2);
    let profile = harness.profile(APP, "u1").await.expect("profile");
    assert_eq!(
        profile.scores,
        vec![UserScore {
            score_name: ScoreName::new("arcade").expect("name"),
            value: 90
        }]
    );
}

#[rstest]
#[tokio::test]
async fn raising_a_value_never_worsens_the_rank(#[future] harness: Harness) {
    let harness = harness.await;
    for (user, value) in [("a", 10), ("b", 20), ("c", 30), ("d", 40)] {
        harness.register(user, None).await.expect("register");
        harness.submit(user, "arcade", value).await.expect("submit");
    }

    let mut previous = u64::MAX;
    for value in [0, 15, 25, 35, 45] {
        let rank = harness.submit("a", "arcade", value).await.expect("submit").rank;
        assert!(rank <= previous, "rank {rank} worse than {previous} at {value}");
        previous = rank;
    }
}

#[rstest]
#[tokio::test]
async fn submitting_for_an_unknown_app_is_a_store_failure(#[future] harness: Harness) {
    let harness = harness.await;
    harness.register("u1", None).await.expect("register");

    let error = harness
        .service
        .submit_score(signed(SubmitScoreRequest {
            app_id: UNKNOWN_APP.to_owned(),
            score_name: "arcade".to_owned(),
            value: 1,
            user_id: "u1".to_owned(),
        }))
        .await
        .expect_err("foreign key");
    assert_eq!(error.code(), ErrorCode::InternalError);
    assert_eq!(harness.store.score_count().await, 0);
}

#[rstest]
#[case(UNKNOWN_APP, "arcade", "u1", ErrorReason::AppNotFound)]
#[case("not-a-uuid", "arcade", "u1", ErrorReason::AppNotFound)]
#[case(APP, "racing", "u1", ErrorReason::ScoreNameNotFound)]
#[case(APP, "", "u1", ErrorReason::ScoreNameNotFound)]
#[case(APP, "arcade", "ghost", ErrorReason::UserNotFound)]
#[case(APP, "arcade", "", ErrorReason::UserNotFound)]
#[case(APP, "arcade", "u2", ErrorReason::ScoreNameNotFound)]
#[tokio::test]
async fn rank_lookups_report_what_is_missing(
    #[future] harness: Harness,
    #[case] app_id: &str,
    #[case] score_name: &str,
    #[case] user_id: &str,
    #[case] expected: ErrorReason,
) {
    let harness = harness.await;
    harness.register("u1", None).await.expect("u1");
    harness.register("u2", None).await.expect("u2");
    harness.submit("u1", "arcade", 5).await.expect("submit");

    let result = harness.rank(app_id, score_name, user_id).await;
    assert_eq!(reason(result), Some(expected));
}

#[rstest]
#[tokio::test]
async fn get_user_lists_scores_by_name(#[future] harness: Harness) {
    let harness = harness.await;
    harness.register("u1", Some("Ada")).await.expect("register");
    harness.submit("u1", "zeta", 3).await.expect("zeta");
    harness.submit("u1", "alpha", 7).await.expect("alpha");

    let profile = harness.profile(APP, "u1").await.expect("profile");
    assert_eq!(profile.nickname.as_ref(), "Ada");
    let names: Vec<&str> = profile
        .scores
        .iter()
        .map(|score| score.score_name.as_ref())
        .collect();
    assert_eq!(names, ["alpha", "zeta"]);
}

#[rstest]
#[case(UNKNOWN_APP, "u1", ErrorReason::AppNotFound)]
#[case(APP, "ghost", ErrorReason::UserNotFound)]
#[tokio::test]
async fn get_user_requires_app_and_user(
    #[future] harness: Harness,
    #[case] app_id: &str,
    #[case] user_id: &str,
    #[case] expected: ErrorReason,
) {
    let harness = harness.await;
    harness.register("u1", None).await.expect("register");
    assert_eq!(reason(harness.profile(app_id, user_id).await), Some(expected));
}

#[rstest]
#[tokio::test]
async fn nickname_updates_require_an_existing_user(#[future] harness: Harness) {
    let harness = harness.await;
    harness.register("u1", Some("Ada")).await.expect("register");

    harness
        .service
        .update_nickname(signed(UpdateNicknameRequest {
            user_id: "u1".to_owned(),
            nickname: "Countess".to_owned(),
        }))
        .await
        .expect("rename");
    let missing = harness
        .service
        .update_nickname(signed(UpdateNicknameRequest {
            user_id: "ghost".to_owned(),
            nickname: "Nobody".to_owned(),
        }))
        .await;
    let blank = harness
        .service
        .update_nickname(signed(UpdateNicknameRequest {
            user_id: "u1".to_owned(),
            nickname: "  ".to_owned(),
        }))
        .await
        .expect_err("blank nickname");

    assert_eq!(reason(missing), Some(ErrorReason::UserNotFound));
    assert_eq!(blank.code(), ErrorCode::InvalidRequest);
    let profile = harness.profile(APP, "u1").await.expect("profile");
    assert_eq!(profile.nickname.as_ref(), "Countess");
}

#[rstest]
#[tokio::test]
async fn deleting_a_user_cascades_and_is_not_idempotent(#[future] harness: Harness) {
    let harness = harness.await;
    harness.register("u1", None).await.expect("u1");
    harness.register("u2", None).await.expect("u2");
    harness.submit("u1", "arcade", 10).await.expect("u1 score");
    harness.submit("u2", "arcade", 20).await.expect("u2 score");
    let delete = || {
        harness.service.delete_user(signed(DeleteUserRequest {
            user_id: "u1".to_owned(),
        }))
    };

    delete().await.expect("first delete");
    let second = delete().await;

    assert_eq!(reason(second), Some(ErrorReason::UserNotFound));
    assert_eq!(harness.store.score_count().await, 1);
    let top = harness.top("u1", "arcade", 10).await.expect("top");
    assert_eq!(top.scores.len(), 1);
    assert_eq!((top.user_score, top.user_rank), (0, -1));
}

#[rstest]
#[tokio::test]
async fn deleting_a_missing_score_is_not_found(#[future] harness: Harness) {
    let harness = harness.await;
    harness.register("u1", None).await.expect("register");
    harness.submit("u1", "arcade", 10).await.expect("submit");
    let delete = |score_name: &str| {
        harness.service.delete_score(signed(DeleteScoreRequest {
            app_id: APP.to_owned(),
            score_name: score_name.to_owned(),
            user_id: "u1".to_owned(),
        }))
    };

    delete("arcade").await.expect("delete");
    assert_eq!(reason(delete("arcade").await), Some(ErrorReason::ScoreNameNotFound));
    assert_eq!(reason(delete("").await), Some(ErrorReason::ScoreNameNotFound));
    assert_eq!(harness.store.score_count().await, 0);
}

#[rstest]
#[tokio::test]
async fn top_scores_orders_by_value_then_user(#[future] harness: Harness) {
    let harness = harness.await;
    for (user, value) in [("carol", 50), ("alice", 70), ("bob", 70), ("dave", 10)] {
        harness.register(user, Some(user)).await.expect("register");
        harness.submit(user, "arcade", value).await.expect("submit");
    }

    let top = harness.top("carol", "arcade", 3).await.expect("top");
    let order: Vec<(&str, i32)> = top
        .scores
        .iter()
        .map(|entry| (entry.nickname.as_ref(), entry.value))
        .collect();

    assert_eq!(order, [("alice", 70), ("bob", 70), ("carol", 50)]);
    assert_eq!(top.user_score, 50);
    assert_eq!(top.user_rank, 3);
}

#[rstest]
#[case(0, 0)]
#[case(2, 2)]
#[case(99, 3)]
#[tokio::test]
async fn top_scores_truncates_to_k(#[future] harness: Harness, #[case] k: i64, #[case] len: usize) {
    let harness = harness.await;
    for (user, value) in [("a", 1), ("b", 2), ("c", 3)] {
        harness.register(user, None).await.expect("register");
        harness.submit(user, "arcade", value).await.expect("submit");
    }
    assert_eq!(harness.top("a", "arcade", k).await.expect("top").scores.len(), len);
}

#[rstest]
#[tokio::test]
async fn top_scores_reports_absent_requesters_as_unranked(#[future] harness: Harness) {
    let harness = harness.await;
    harness.register("u1", None).await.expect("register");
    harness.submit("u1", "arcade", 10).await.expect("submit");

    let stranger = harness.top("nobody", "arcade", 5).await.expect("top");
    assert_eq!((stranger.user_score, stranger.user_rank), (0, -1));
}

#[rstest]
#[tokio::test]
async fn top_scores_rejects_negative_k_after_authentication(#[future] harness: Harness) {
    let harness = harness.await;
    let bad_k = harness.top("u1", "arcade", -1).await.expect_err("negative k");
    let unsigned = harness
        .service
        .top_scores(SignedRequest::new(
            TopScoresRequest {
                app_id: APP.to_owned(),
                user_id: "u1".to_owned(),
                score_name: "arcade".to_owned(),
                k: -1,
            },
            None,
        ))
        .await;

    assert_eq!(bad_k.code(), ErrorCode::InvalidRequest);
    assert_eq!(reason(unsigned), Some(ErrorReason::NoDigest));
}

#[rstest]
#[tokio::test]
async fn top_scores_propagates_missing_boards(#[future] harness: Harness) {
    let harness = harness.await;
    assert_eq!(
        reason(harness.top("u1", "arcade", 5).await),
        Some(ErrorReason::ScoreNameNotFound)
    );
}

#[rstest]
#[tokio::test]
async fn unavailable_store_maps_to_service_unavailable(#[future] harness: Harness) {
    let harness = harness.await;
    harness.store.set_offline(true);
    let error = harness.register("u1", None).await.expect_err("offline");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

/// Scores submitted for a scenario, as `(user, value)` pairs.
#[derive(Debug, Clone)]
struct Board(Vec<(&'static str, i32)>);

#[given("a board where u1 scores 120 and u2 and u3 tie on 80")]
fn a_board_with_a_tie() -> Board {
    Board(vec![("u1", 120), ("u2", 80), ("u3", 80)])
}

#[when("every entrant asks for their rank")]
fn every_entrant_asks_for_their_rank(board: &Board) -> Vec<(&'static str, UserRank)> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    runtime.block_on(async {
        let harness = harness().await;
        for (user, value) in &board.0 {
            harness.register(user, None).await.expect("register");
            harness.submit(user, "arcade", *value).await.expect("submit");
        }
        let mut ranks = Vec::new();
        for (user, _) in &board.0 {
            ranks.push((*user, harness.rank(APP, "arcade", user).await.expect("rank")));
        }
        ranks
    })
}

#[then("the leader is first at the 100th percentile and the tied pair share last place")]
fn leader_first_and_tie_shared(ranks: &[(&'static str, UserRank)]) {
    assert_eq!(
        ranks,
        [
            ("u1", UserRank { rank: 1, percentile: 100 }),
            ("u2", UserRank { rank: 3, percentile: 0 }),
            ("u3", UserRank { rank: 3, percentile: 0 }),
        ]
    );
}

#[rstest]
fn ranking_a_board_with_a_tie() {
    let board = a_board_with_a_tie();
    let ranks = every_entrant_asks_for_their_rank(&board);
    leader_first_and_tie_shared(&ranks);
}
