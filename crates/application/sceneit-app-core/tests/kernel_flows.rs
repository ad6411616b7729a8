mod common;

use std::sync::Arc;

use common::ScriptedFetcher;
use sceneit_app_core::actions::split_list;
use sceneit_app_core::screens::keys;
use sceneit_app_core::{
    AppCommand, AppKernel, ItemRef, LoaderOptions, MovieDetailVm, MovieDraft, Notice, ReviewDraft,
    Route,
};
use sceneit_core::{Session, SessionUser};
use sceneit_persistence::{MemorySessionStore, SessionStore};
use serde_json::json;

fn session(user_id: i64) -> Session {
    Session {
        token: Some("t0k3n".into()),
        user: SessionUser {
            user_id,
            username: Some("ana".into()),
            email: Some("ana@example.com".into()),
        },
    }
}

fn kernel(
    fetcher: ScriptedFetcher,
    sessions: MemorySessionStore,
) -> (
    Arc<ScriptedFetcher>,
    Arc<MemorySessionStore>,
    AppKernel<ScriptedFetcher, MemorySessionStore>,
) {
    let fetcher = Arc::new(fetcher);
    let sessions = Arc::new(sessions);
    let kernel = AppKernel::new(fetcher.clone(), sessions.clone(), LoaderOptions::default());
    (fetcher, sessions, kernel)
}

fn movie_backend() -> ScriptedFetcher {
    ScriptedFetcher::new()
        .ok("GET /movies/4", json!({"movie_id": 4, "title": "Heat"}))
        .ok("GET /users/1/liked_movies/4", json!({"is_liked": false}))
}

#[tokio::test]
async fn like_is_shown_only_after_the_backend_confirms() {
    let fetcher = movie_backend().ok(
        "POST /like_movie?user_id=1&movie_id=4",
        json!({"message": "liked"}),
    );
    let (_, _, mut kernel) = kernel(fetcher, MemorySessionStore::with_session(session(1)));
    kernel.dispatch(AppCommand::Navigate(Route::Movie("4".into())));
    kernel.settle().await;

    let vm = MovieDetailVm::from_view(&kernel.view(), &kernel.state());
    assert_eq!(vm.like.as_ref().map(|l| l.liked), Some(false));

    kernel.dispatch(AppCommand::ToggleMovieLike(4));
    assert!(kernel.state().busy.contains(&ItemRef::Movie(4)));
    kernel.settle().await;

    let vm = MovieDetailVm::from_view(&kernel.view(), &kernel.state());
    let like = vm.like.expect("logged in");
    assert!(like.liked);
    assert!(!like.busy);
    assert_eq!(like.error, None);
}

#[tokio::test]
async fn rejected_like_keeps_state_and_reports_inline() {
    // The like endpoint is unscripted, so it answers 404.
    let (fetcher, _, mut kernel) =
        kernel(movie_backend(), MemorySessionStore::with_session(session(1)));
    kernel.dispatch(AppCommand::Navigate(Route::Movie("4".into())));
    kernel.settle().await;

    kernel.dispatch(AppCommand::ToggleMovieLike(4));
    kernel.settle().await;

    assert!(fetcher.called("POST /like_movie"));
    let vm = MovieDetailVm::from_view(&kernel.view(), &kernel.state());
    let like = vm.like.expect("logged in");
    assert!(!like.liked);
    assert!(like
        .error
        .as_deref()
        .is_some_and(|e| e.starts_with("Failed to like movie")));
}

#[tokio::test]
async fn unliking_sends_a_delete() {
    let fetcher = ScriptedFetcher::new()
        .ok("GET /movies/4", json!({"movie_id": 4}))
        .ok("GET /users/1/liked_movies/4", json!({"is_liked": true}))
        .ok("DELETE /unlike_movie?user_id=1&movie_id=4", json!(null));
    let (_, _, mut kernel) = kernel(fetcher, MemorySessionStore::with_session(session(1)));
    kernel.dispatch(AppCommand::Navigate(Route::Movie("4".into())));
    kernel.settle().await;
    kernel.dispatch(AppCommand::ToggleMovieLike(4));
    kernel.settle().await;

    assert_eq!(kernel.state().movie_likes.get(&4), Some(&false));
}

#[tokio::test]
async fn like_waits_for_a_known_like_status() {
    let fetcher = ScriptedFetcher::new()
        .ok("GET /movies/4", json!({"movie_id": 4}))
        .hang("GET /users/1/liked_movies/4");
    let (fetcher, _, mut kernel) = kernel(fetcher, MemorySessionStore::with_session(session(1)));
    kernel.dispatch(AppCommand::Navigate(Route::Movie("4".into())));
    kernel.tick();

    kernel.dispatch(AppCommand::ToggleMovieLike(4));
    kernel.tick();

    assert!(!fetcher.called("POST /like_movie"));
    assert!(!fetcher.called("DELETE /unlike_movie"));
    let state = kernel.state();
    assert!(!state.busy.contains(&ItemRef::Movie(4)));
    assert_eq!(
        state.item_errors.get(&ItemRef::Movie(4)).map(String::as_str),
        Some("Like status is not loaded yet.")
    );
}

#[tokio::test]
async fn failed_like_status_blocks_toggling() {
    let fetcher = ScriptedFetcher::new()
        .ok("GET /movies/4", json!({"movie_id": 4}))
        .status("GET /users/1/liked_movies/4", 500, "boom");
    let (fetcher, _, mut kernel) = kernel(fetcher, MemorySessionStore::with_session(session(1)));
    kernel.dispatch(AppCommand::Navigate(Route::Movie("4".into())));
    kernel.settle().await;

    kernel.dispatch(AppCommand::ToggleMovieLike(4));
    kernel.settle().await;

    assert!(!fetcher.called("POST /like_movie"));
    assert!(kernel.state().item_errors.contains_key(&ItemRef::Movie(4)));
}

#[tokio::test]
async fn session_is_read_at_screen_entry() {
    let (fetcher, sessions, mut kernel) = kernel(movie_backend(), MemorySessionStore::new());
    kernel.dispatch(AppCommand::Navigate(Route::Movie("4".into())));
    kernel.settle().await;
    assert!(kernel.view().outcome(keys::LIKE_STATUS).is_none());
    assert!(!fetcher.called("GET /users/1/liked_movies"));

    sessions.set(&session(1)).expect("memory store");
    kernel.dispatch(AppCommand::Reload);
    kernel.settle().await;
    assert!(kernel.view().outcome(keys::LIKE_STATUS).is_some());
    assert!(kernel.state().is_authenticated());
}

#[tokio::test]
async fn anonymous_like_asks_to_log_in_without_calling_out() {
    let (fetcher, _, mut kernel) = kernel(movie_backend(), MemorySessionStore::new());
    kernel.dispatch(AppCommand::Navigate(Route::Movie("4".into())));
    kernel.settle().await;

    kernel.dispatch(AppCommand::ToggleMovieLike(4));
    kernel.settle().await;

    assert!(!fetcher.called("POST"));
    assert_eq!(
        kernel
            .state()
            .item_errors
            .get(&ItemRef::Movie(4))
            .map(String::as_str),
        Some("Please log in to like movies.")
    );
}

#[tokio::test]
async fn review_like_bumps_the_displayed_count() {
    let fetcher = ScriptedFetcher::new()
        .ok("GET /movies/4", json!({"movie_id": 4, "title": "Heat"}))
        .ok(
            "GET /reviews/search?movie_id=4",
            json!({"results": [{"review_id": 11}]}),
        )
        .ok(
            "GET /reviews/11",
            json!({"review": {"review_id": 11, "like_count": 2}}),
        )
        .ok("POST /likes/", json!({"like_id": 1}));
    let (_, _, mut kernel) = kernel(fetcher, MemorySessionStore::with_session(session(1)));
    kernel.dispatch(AppCommand::Navigate(Route::ViewReviews("4".into())));
    kernel.settle().await;
    kernel.dispatch(AppCommand::LikeReview(11));
    kernel.settle().await;

    let vm = sceneit_app_core::ReviewsVm::from_view(&kernel.view(), &kernel.state());
    assert_eq!(vm.movie_title, "Heat");
    assert_eq!(vm.reviews.ready().expect("reviews loaded")[0].likes, 3);
}

#[tokio::test]
async fn login_persists_the_session_and_opens_explore() {
    let fetcher = ScriptedFetcher::new().ok(
        "POST /users/login",
        json!({"user_id": 3, "username": "ana", "token": "abc"}),
    );
    let (fetcher, sessions, mut kernel) = kernel(fetcher, MemorySessionStore::new());
    kernel.dispatch(AppCommand::Navigate(Route::Login));
    kernel.dispatch(AppCommand::Login {
        email: "ana@example.com".into(),
        password: "hunter2".into(),
    });
    kernel.settle().await;

    let stored = sessions.get().expect("memory store").expect("logged in");
    assert_eq!(stored.user_id(), 3);
    assert_eq!(stored.token.as_deref(), Some("abc"));
    assert_eq!(kernel.state().route, Route::Explore);
    assert!(fetcher.called("GET /explore/top_reviewed"));
    assert!(kernel.view().all_settled());
}

#[tokio::test]
async fn failed_login_stays_on_the_form() {
    let fetcher = ScriptedFetcher::new().status("POST /users/login", 401, "Invalid credentials");
    let (_, sessions, mut kernel) = kernel(fetcher, MemorySessionStore::new());
    kernel.dispatch(AppCommand::Navigate(Route::Login));
    kernel.dispatch(AppCommand::Login {
        email: "ana@example.com".into(),
        password: "wrong".into(),
    });
    kernel.settle().await;

    assert_eq!(kernel.state().route, Route::Login);
    assert!(sessions.get().expect("memory store").is_none());
    assert!(matches!(
        kernel.state().notice,
        Some(Notice::Error(ref m)) if m.contains("Invalid credentials")
    ));
}

#[tokio::test]
async fn signup_leads_to_login() {
    let fetcher = ScriptedFetcher::new().ok("POST /users/signup", json!({"user_id": 5}));
    let (_, _, mut kernel) = kernel(fetcher, MemorySessionStore::new());
    kernel.dispatch(AppCommand::Navigate(Route::Signup));
    kernel.dispatch(AppCommand::Signup {
        username: "bo".into(),
        email: "bo@example.com".into(),
        password: "pw".into(),
    });
    kernel.settle().await;

    assert_eq!(kernel.state().route, Route::Login);
    assert!(matches!(kernel.state().notice, Some(Notice::Info(_))));
}

#[tokio::test]
async fn out_of_range_rating_is_rejected_locally() {
    let (fetcher, _, mut kernel) = kernel(
        ScriptedFetcher::new().ok("GET /movies/4", json!({"movie_id": 4})),
        MemorySessionStore::with_session(session(1)),
    );
    kernel.dispatch(AppCommand::Navigate(Route::WriteReview("4".into())));
    kernel.settle().await;
    kernel.dispatch(AppCommand::SubmitReview {
        movie_id: 4,
        draft: ReviewDraft {
            title: "Too good".into(),
            content: String::new(),
            rating: 101.0,
        },
    });
    kernel.settle().await;

    assert!(!fetcher.called("POST /reviews/"));
    assert!(matches!(kernel.state().notice, Some(Notice::Error(_))));
    assert_eq!(kernel.state().route, Route::WriteReview("4".into()));
}

#[tokio::test]
async fn submitted_review_opens_the_listing() {
    let fetcher = ScriptedFetcher::new()
        .ok("GET /movies/4", json!({"movie_id": 4}))
        .ok("POST /reviews/", json!({"review_id": 12}))
        .ok("GET /reviews/search?movie_id=4", json!({"results": []}));
    let (_, _, mut kernel) = kernel(fetcher, MemorySessionStore::with_session(session(1)));
    kernel.dispatch(AppCommand::Navigate(Route::WriteReview("4".into())));
    kernel.settle().await;
    kernel.dispatch(AppCommand::SubmitReview {
        movie_id: 4,
        draft: ReviewDraft {
            title: "Tense".into(),
            content: "Great heist".into(),
            rating: 88.0,
        },
    });
    kernel.settle().await;

    assert_eq!(kernel.state().route, Route::ViewReviews("4".into()));
    assert!(kernel.view().all_settled());
    assert!(!kernel.view().any_failed());
}

#[tokio::test]
async fn logout_clears_the_stored_session() {
    let (_, sessions, mut kernel) = kernel(
        ScriptedFetcher::new(),
        MemorySessionStore::with_session(session(1)),
    );
    kernel.boot(Route::Explore);
    kernel.settle().await;
    assert!(kernel.state().is_authenticated());

    kernel.dispatch(AppCommand::Logout);
    assert!(sessions.get().expect("memory store").is_none());
    assert!(!kernel.state().is_authenticated());
    assert_eq!(kernel.state().route, Route::Login);
}

#[tokio::test]
async fn logout_during_login_wins() {
    let fetcher = ScriptedFetcher::new().ok(
        "POST /users/login",
        json!({"user_id": 3, "username": "ana", "token": "abc"}),
    );
    let (fetcher, sessions, mut kernel) = kernel(fetcher, MemorySessionStore::new());
    let release = fetcher.gate("POST /users/login");
    kernel.dispatch(AppCommand::Navigate(Route::Login));
    kernel.dispatch(AppCommand::Login {
        email: "ana@example.com".into(),
        password: "hunter2".into(),
    });
    kernel.dispatch(AppCommand::Logout);
    let _ = release.send(());
    kernel.settle().await;

    assert!(fetcher.called("POST /users/login"));
    assert!(sessions.get().expect("memory store").is_none());
    assert!(!kernel.state().is_authenticated());
    assert_eq!(kernel.state().route, Route::Login);
}

fn heat() -> MovieDraft {
    MovieDraft {
        title: "Heat".into(),
        genres: split_list("Crime, Drama"),
        directors: split_list("Michael Mann"),
        runtime_in_minutes: 170,
        ..MovieDraft::default()
    }
}

#[tokio::test]
async fn movie_forms_report_through_the_page_notice() {
    let fetcher = ScriptedFetcher::new()
        .ok("POST /movies/", json!({"movie_id": 40}))
        .ok("PUT /movies/40", json!({"movie_id": 40}));
    let (fetcher, _, mut kernel) = kernel(fetcher, MemorySessionStore::new());
    kernel.boot(Route::MovieTable);
    kernel.settle().await;

    kernel.dispatch(AppCommand::CreateMovie(heat()));
    kernel.settle().await;
    assert!(fetcher.called("POST /movies/"));
    assert_eq!(
        kernel.state().notice,
        Some(Notice::Info("Movie 'Heat' added.".into()))
    );

    kernel.dispatch(AppCommand::UpdateMovie {
        movie_id: 40,
        draft: heat(),
    });
    kernel.settle().await;
    assert_eq!(
        kernel.state().notice,
        Some(Notice::Info("Movie #40 updated.".into()))
    );

    // Unscripted, so the backend answers 404.
    kernel.dispatch(AppCommand::DeleteMovie(40));
    kernel.settle().await;
    assert!(fetcher.called("DELETE /movies/40"));
    assert!(matches!(
        kernel.state().notice,
        Some(Notice::Error(ref m)) if m.starts_with("Failed to delete movie")
    ));
}

#[tokio::test]
async fn untitled_movie_is_rejected_without_a_request() {
    let (fetcher, _, mut kernel) = kernel(ScriptedFetcher::new(), MemorySessionStore::new());
    kernel.dispatch(AppCommand::CreateMovie(MovieDraft::default()));
    kernel.settle().await;

    assert!(!fetcher.called("POST /movies/"));
    assert_eq!(
        kernel.state().notice,
        Some(Notice::Error("Movie title cannot be empty.".into()))
    );
}
