use chrono::{DateTime, NaiveDate, NaiveDateTime};
use sceneit_core::envelope::{decode_rows, rows};
use sceneit_core::{
    LikedMovie, Movie, MovieId, Reputation, RequestOutcome, Review, SimilarUser, UserSummary, ViewModel,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{AppState, ItemRef, Route, TablePrefs};
use crate::screens::keys;

/// Display state of one screen section, bound to exactly one spec key.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> Section<T> {
    pub fn from_outcome(outcome: Option<&RequestOutcome>, project: impl FnOnce(&Value) -> T) -> Self {
        match outcome {
            None | Some(RequestOutcome::Pending) => Section::Loading,
            Some(RequestOutcome::Failure(e)) => Section::Failed(e.to_string()),
            Some(RequestOutcome::Success(v)) => Section::Ready(project(v)),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Section::Loading)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Section<U> {
        match self {
            Section::Loading => Section::Loading,
            Section::Failed(e) => Section::Failed(e),
            Section::Ready(v) => Section::Ready(f(v)),
        }
    }
}

fn list_section<T: DeserializeOwned>(view: &ViewModel, key: &str) -> Section<Vec<T>> {
    Section::from_outcome(view.outcome(key), |v| decode_rows(v))
}

fn reviews_of(value: &Value) -> Vec<Review> {
    rows(value).iter().filter_map(Review::from_payload).collect()
}

/// `Mon D, YYYY`; `Never` when absent; `Invalid date` when unparsable.
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return "Never".into();
    };
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));
    match date {
        Ok(d) => d.format("%b %-d, %Y").to_string(),
        Err(_) => "Invalid date".into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExploreVm {
    pub top_reviewed: Section<Vec<Movie>>,
    pub worst: Section<Vec<Movie>>,
    pub best: Section<Vec<Movie>>,
    pub top_liked_users: Section<Vec<UserSummary>>,
}

impl ExploreVm {
    pub fn from_view(view: &ViewModel) -> Self {
        Self {
            top_reviewed: list_section(view, keys::TOP_REVIEWED),
            worst: list_section(view, keys::WORST),
            best: list_section(view, keys::BEST),
            top_liked_users: list_section(view, keys::TOP_LIKED_USERS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileVm {
    pub title: String,
    pub user: Section<UserSummary>,
    pub reviews: Section<Vec<Review>>,
    pub liked_reviews: Section<Vec<Review>>,
    pub similar_users: Section<Vec<SimilarUser>>,
    pub reputation: Section<Reputation>,
    pub liked_movies: Section<Vec<LikedMovie>>,
}

impl ProfileVm {
    pub fn from_view(user_id: &str, view: &ViewModel) -> Self {
        let user = Section::from_outcome(view.outcome(keys::USER), |v| {
            serde_json::from_value::<UserSummary>(v.get("user").unwrap_or(v).clone())
                .unwrap_or_default()
        });
        let title = user
            .ready()
            .and_then(|u| u.username.as_deref())
            .filter(|name| !name.is_empty())
            .map(|name| format!("{name}'s Profile"))
            .unwrap_or_else(|| format!("User {user_id}'s Profile"));

        Self {
            title,
            user,
            reviews: Section::from_outcome(view.outcome(keys::REVIEWS), reviews_of),
            liked_reviews: Section::from_outcome(view.outcome(keys::LIKED_REVIEWS), reviews_of),
            similar_users: list_section(view, keys::SIMILAR_USERS),
            reputation: Section::from_outcome(view.outcome(keys::REPUTATION), |v| {
                let mut rep: Reputation = serde_json::from_value(v.clone()).unwrap_or_default();
                rep.reputation_score.get_or_insert(0.0);
                rep
            }),
            liked_movies: list_section(view, keys::LIKED_MOVIES),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LikeControlVm {
    pub liked: bool,
    pub busy: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetailVm {
    pub movie: Section<Movie>,
    /// `None` when nobody is logged in.
    pub like: Option<LikeControlVm>,
    pub released: String,
    pub streaming: String,
}

/// The like flag loaded for this screen, unless an action since confirmed otherwise.
pub fn liked_from_view(view: &ViewModel) -> Option<bool> {
    view.outcome(keys::LIKE_STATUS)?
        .payload()?
        .get("is_liked")?
        .as_bool()
}

impl MovieDetailVm {
    pub fn from_view(view: &ViewModel, state: &AppState) -> Self {
        let movie = Section::from_outcome(view.outcome(keys::MOVIE), |v| {
            serde_json::from_value::<Movie>(v.get("movie").unwrap_or(v).clone()).unwrap_or_default()
        });
        let movie_id = match &state.route {
            Route::Movie(id) => id.parse::<MovieId>().ok(),
            _ => None,
        }
        .or_else(|| movie.ready().and_then(|m| m.movie_id));

        let like = match (&state.session, movie_id) {
            (Some(_), Some(id)) => {
                let item = ItemRef::Movie(id);
                Some(LikeControlVm {
                    liked: state
                        .movie_likes
                        .get(&id)
                        .copied()
                        .or_else(|| liked_from_view(view))
                        .unwrap_or(false),
                    busy: state.busy.contains(&item),
                    error: state.item_errors.get(&item).cloned(),
                })
            }
            _ => None,
        };
        let (released, streaming) = match movie.ready() {
            Some(m) => (
                format_date(m.in_theaters_date.as_deref()),
                format_date(m.on_streaming_date.as_deref()),
            ),
            None => (format_date(None), format_date(None)),
        };
        Self {
            movie,
            like,
            released,
            streaming,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRowVm {
    pub review: Review,
    pub likes: u64,
    pub busy: bool,
    pub error: Option<String>,
    pub posted: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewsVm {
    pub movie_title: String,
    pub reviews: Section<Vec<ReviewRowVm>>,
}

impl ReviewsVm {
    pub fn from_view(view: &ViewModel, state: &AppState) -> Self {
        let movie_title = match view.outcome(keys::MOVIE) {
            Some(RequestOutcome::Success(v)) => v
                .get("movie")
                .unwrap_or(v)
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("(Unknown Movie)")
                .to_string(),
            Some(RequestOutcome::Failure(_)) => "(Unknown Movie)".into(),
            _ => "Loading...".into(),
        };
        let reviews = Section::from_outcome(view.outcome(keys::REVIEWS), reviews_of).map(|list| {
            list.into_iter()
                .map(|review| {
                    let item = review.review_id.map(ItemRef::Review);
                    let bump = review
                        .review_id
                        .and_then(|id| state.review_like_bumps.get(&id))
                        .copied()
                        .unwrap_or(0);
                    ReviewRowVm {
                        likes: review.like_count.unwrap_or(0) + bump,
                        busy: item.is_some_and(|i| state.busy.contains(&i)),
                        error: item.and_then(|i| state.item_errors.get(&i).cloned()),
                        posted: format_date(review.created_at.as_deref()),
                        review,
                    }
                })
                .collect()
        });
        Self {
            movie_title,
            reviews,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    pub rows: Vec<Movie>,
    /// Zero-based, clamped to the last page.
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub matched: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieTableVm {
    pub table: Section<TablePage>,
}

impl MovieTableVm {
    pub fn from_view(view: &ViewModel, prefs: &TablePrefs) -> Self {
        let table = list_section::<Movie>(view, keys::MOVIES).map(|movies| paginate(movies, prefs));
        Self { table }
    }
}

/// Case-insensitive filter over title and rating, then one page of the result.
pub fn paginate(movies: Vec<Movie>, prefs: &TablePrefs) -> TablePage {
    let needle = prefs.filter.trim().to_lowercase();
    let matched: Vec<Movie> = movies
        .into_iter()
        .filter(|m| {
            needle.is_empty()
                || [m.title.as_deref(), m.rating.as_deref()]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect();

    let page_size = sceneit_config::clamp_page_size(prefs.page_size);
    let page_count = matched.len().div_ceil(page_size).max(1);
    let page = prefs.page.min(page_count - 1);
    let total = matched.len();
    let rows = matched
        .into_iter()
        .skip(page * page_size)
        .take(page_size)
        .collect();
    TablePage {
        rows,
        page,
        page_count,
        page_size,
        matched: total,
    }
}
