//! Spec lists for each screen. Every section of a screen binds to one key.

use sceneit_core::envelope::{id_list, rows};
use sceneit_core::{Derived, LoadFailure, RequestSpec, Resource, Session};
use serde_json::{json, Value};

use crate::domain::{MovieQuery, Route};

pub mod keys {
    pub const TOP_REVIEWED: &str = "topReviewed";
    pub const WORST: &str = "worst";
    pub const BEST: &str = "best";
    pub const TOP_LIKED_USERS: &str = "topLikedUsers";

    pub const USER: &str = "user";
    pub const REVIEWS: &str = "reviews";
    pub const LIKED_REVIEW_IDS: &str = "likedReviewIds";
    pub const LIKED_REVIEWS: &str = "likedReviews";
    pub const SIMILAR_USERS: &str = "similarUsers";
    pub const REPUTATION: &str = "reputation";
    pub const LIKED_MOVIES: &str = "likedMovies";

    pub const MOVIE: &str = "movie";
    pub const LIKE_STATUS: &str = "likeStatus";
    pub const REVIEW_STUBS: &str = "reviewStubs";

    pub const MOVIES: &str = "movies";
}

/// Specs loaded on entry to `route`. The session is read by the caller at screen entry.
pub fn specs_for(route: &Route, session: Option<&Session>) -> Vec<RequestSpec> {
    match route {
        Route::Explore => explore_specs(),
        Route::MovieTable | Route::Search => search_specs(&MovieQuery::default()),
        Route::Login | Route::Signup => Vec::new(),
        Route::Movie(id) => movie_specs(id, session),
        Route::WriteReview(id) => vec![movie_spec(id)],
        Route::ViewReviews(id) => review_listing_specs(id),
        Route::Profile(id) => profile_specs(id),
    }
}

pub fn explore_specs() -> Vec<RequestSpec> {
    vec![
        RequestSpec::fetch(keys::TOP_REVIEWED, Resource::get("/explore/top_reviewed")),
        RequestSpec::fetch(keys::WORST, Resource::get("/explore/worst_rated")),
        RequestSpec::fetch(keys::BEST, Resource::get("/explore/best_rated")),
        RequestSpec::fetch(
            keys::TOP_LIKED_USERS,
            Resource::get("/explore/top_liked_users"),
        ),
    ]
}

pub fn profile_specs(user_id: &str) -> Vec<RequestSpec> {
    let base = format!("/user_profile/{user_id}");
    vec![
        RequestSpec::fetch(keys::USER, Resource::get(format!("/users/{user_id}"))),
        RequestSpec::fetch(keys::REVIEWS, Resource::get(format!("{base}/user_reviews"))),
        RequestSpec::fetch(
            keys::LIKED_REVIEW_IDS,
            Resource::get(format!("{base}/user_liked")),
        ),
        RequestSpec::derive(keys::LIKED_REVIEWS, keys::LIKED_REVIEW_IDS, |payload| {
            let ids = id_list(payload, "review_ids")
                .ok_or_else(|| LoadFailure::Decode("missing review_ids".into()))?;
            Ok(Derived::Each(
                ids.into_iter()
                    .map(|id| Resource::get(format!("/reviews/{id}")))
                    .collect(),
            ))
        }),
        RequestSpec::fetch(
            keys::SIMILAR_USERS,
            Resource::get(format!("{base}/similar_likes")),
        ),
        RequestSpec::fetch(keys::REPUTATION, Resource::get(format!("{base}/reputation")))
            .or_on_not_found(json!({"reputation_score": 0, "last_updated": null})),
        RequestSpec::fetch(
            keys::LIKED_MOVIES,
            Resource::get(format!("{base}/liked_movies")),
        ),
    ]
}

fn movie_spec(movie_id: &str) -> RequestSpec {
    RequestSpec::fetch(keys::MOVIE, Resource::get(format!("/movies/{movie_id}")))
}

pub fn movie_specs(movie_id: &str, session: Option<&Session>) -> Vec<RequestSpec> {
    let mut specs = vec![movie_spec(movie_id)];
    if let Some(session) = session {
        specs.push(
            RequestSpec::fetch(
                keys::LIKE_STATUS,
                Resource::get(format!(
                    "/users/{}/liked_movies/{movie_id}",
                    session.user_id()
                )),
            )
            .or_on_not_found(json!({"is_liked": false})),
        );
    }
    specs
}

pub fn review_listing_specs(movie_id: &str) -> Vec<RequestSpec> {
    vec![
        movie_spec(movie_id),
        RequestSpec::fetch(
            keys::REVIEW_STUBS,
            Resource::get("/reviews/search").query("movie_id", movie_id),
        ),
        RequestSpec::derive(keys::REVIEWS, keys::REVIEW_STUBS, |payload| {
            let ids = rows(payload)
                .iter()
                .filter_map(|stub| stub.get("review_id").and_then(Value::as_i64))
                .map(|id| Resource::get(format!("/reviews/{id}")))
                .collect();
            Ok(Derived::Each(ids))
        }),
    ]
}

pub fn search_specs(query: &MovieQuery) -> Vec<RequestSpec> {
    let mut resource = Resource::get("/movies/search");
    if let Some(title) = query.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        resource = resource.query("title", title);
    }
    for (name, values) in [
        ("genres", &query.genres),
        ("writers", &query.writers),
        ("actors", &query.actors),
        ("studios", &query.studios),
        ("directors", &query.directors),
    ] {
        for v in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
            resource = resource.query(name, v);
        }
    }
    if let Some(year) = query.year {
        resource = resource.query("year", year);
    }
    vec![RequestSpec::fetch(keys::MOVIES, resource)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sceneit_core::{validate, RequestPlan, SessionUser};

    fn keys_of(specs: &[RequestSpec]) -> Vec<&str> {
        specs.iter().map(|s| s.key.as_str()).collect()
    }

    #[test]
    fn every_screen_builds_a_valid_spec_list() {
        let session = Session {
            token: None,
            user: SessionUser {
                user_id: 1,
                ..Default::default()
            },
        };
        for path in [
            "/",
            "/movies",
            "/search",
            "/login",
            "/movie/1",
            "/write-review/1",
            "/view-reviews/1",
            "/profile/1",
        ] {
            let route = Route::parse(path).unwrap();
            assert_eq!(validate(&specs_for(&route, Some(&session))), Ok(()), "{path}");
            assert_eq!(validate(&specs_for(&route, None)), Ok(()), "{path}");
        }
    }

    #[test]
    fn like_status_only_when_authenticated() {
        assert_eq!(keys_of(&movie_specs("4", None)), vec!["movie"]);
        let session = Session {
            token: None,
            user: SessionUser {
                user_id: 9,
                ..Default::default()
            },
        };
        let specs = movie_specs("4", Some(&session));
        assert_eq!(keys_of(&specs), vec!["movie", "likeStatus"]);
        match &specs[1].plan {
            RequestPlan::Fetch(r) => assert_eq!(r.path, "/users/9/liked_movies/4"),
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn search_query_skips_blank_fields_and_repeats_lists() {
        let query = MovieQuery {
            title: Some("  ".into()),
            genres: vec!["Drama".into(), "".into(), "Crime".into()],
            year: Some(1994),
            ..Default::default()
        };
        let specs = search_specs(&query);
        match &specs[0].plan {
            RequestPlan::Fetch(r) => assert_eq!(
                r.describe(),
                "GET /movies/search?genres=Drama&genres=Crime&year=1994"
            ),
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn liked_reviews_derive_one_request_per_id() {
        let specs = profile_specs("7");
        let liked = specs.iter().find(|s| s.key == keys::LIKED_REVIEWS).unwrap();
        assert_eq!(liked.depends_on.as_deref(), Some(keys::LIKED_REVIEW_IDS));
        let RequestPlan::Derive(derive) = &liked.plan else {
            panic!("expected derived plan");
        };
        let derived = (**derive)(&json!({"review_ids": [1, 2]})).unwrap();
        assert_eq!(
            derived,
            Derived::Each(vec![Resource::get("/reviews/1"), Resource::get("/reviews/2")])
        );
        assert!((**derive)(&json!({"nothing": true})).is_err());
    }
}
