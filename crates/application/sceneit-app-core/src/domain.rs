use std::collections::{HashMap, HashSet};
use std::fmt;

use sceneit_core::{MovieId, ReviewId, Session};
use serde::{Deserialize, Serialize};

/// The current screen. Path parameters stay plain strings, as the router hands them over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Explore,
    MovieTable,
    Search,
    Login,
    Signup,
    Movie(String),
    WriteReview(String),
    ViewReviews(String),
    Profile(String),
}

impl Route {
    /// Parses a router path; a query string or fragment is ignored.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let route = match segments.as_slice() {
            [] => Route::Explore,
            ["movies"] => Route::MovieTable,
            ["search"] => Route::Search,
            ["login"] => Route::Login,
            ["signup"] => Route::Signup,
            ["movie", id] => Route::Movie(id.to_string()),
            ["write-review", id] => Route::WriteReview(id.to_string()),
            ["view-reviews", id] => Route::ViewReviews(id.to_string()),
            ["profile", id] => Route::Profile(id.to_string()),
            _ => return None,
        };
        Some(route)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Explore => "/".into(),
            Route::MovieTable => "/movies".into(),
            Route::Search => "/search".into(),
            Route::Login => "/login".into(),
            Route::Signup => "/signup".into(),
            Route::Movie(id) => format!("/movie/{id}"),
            Route::WriteReview(id) => format!("/write-review/{id}"),
            Route::ViewReviews(id) => format!("/view-reviews/{id}"),
            Route::Profile(id) => format!("/profile/{id}"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// A control that can carry its own busy flag and inline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRef {
    Movie(MovieId),
    Review(ReviewId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Multi-field movie search form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieQuery {
    pub title: Option<String>,
    pub genres: Vec<String>,
    pub writers: Vec<String>,
    pub actors: Vec<String>,
    pub studios: Vec<String>,
    pub directors: Vec<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePrefs {
    pub filter: String,
    pub page: usize,
    pub page_size: usize,
}

impl Default for TablePrefs {
    fn default() -> Self {
        Self {
            filter: String::new(),
            page: 0,
            page_size: sceneit_config::DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub route: Route,
    pub session: Option<Session>,
    pub query: MovieQuery,
    pub table: TablePrefs,

    /// Confirmed like flags, overriding what the screen loaded.
    pub movie_likes: HashMap<MovieId, bool>,
    /// Confirmed review likes added since the screen loaded.
    pub review_like_bumps: HashMap<ReviewId, u64>,
    pub busy: HashSet<ItemRef>,
    pub item_errors: HashMap<ItemRef, String>,
    pub notice: Option<Notice>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            route: Route::Explore,
            session: None,
            query: MovieQuery::default(),
            table: TablePrefs::default(),
            movie_likes: HashMap::new(),
            review_like_bumps: HashMap::new(),
            busy: HashSet::new(),
            item_errors: HashMap::new(),
            notice: None,
        }
    }
}

impl AppState {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}
