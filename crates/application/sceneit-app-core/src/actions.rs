//! Single REST mutations. Callers update displayed state only after `Ok`.

use sceneit_config::MAX_REVIEW_RATING;
use sceneit_core::{LoadFailure, MovieId, Resource, ReviewId, Session, UserId};
use sceneit_infra::Fetcher;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("Please log in to {0}.")]
    NotAuthenticated(&'static str),
    #[error("{0}")]
    Invalid(String),
    #[error("Failed to {action}: {source}")]
    Rejected {
        action: &'static str,
        source: LoadFailure,
    },
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ActionError {
    fn rejected(action: &'static str) -> impl FnOnce(LoadFailure) -> ActionError {
        move |source| ActionError::Rejected { action, source }
    }

    pub fn failure(&self) -> Option<&LoadFailure> {
        match self {
            ActionError::Rejected { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// POSTs a like or DELETEs it, returning the flipped flag once the backend confirms.
pub async fn like_toggle<F: Fetcher + ?Sized>(
    fetcher: &F,
    user_id: UserId,
    movie_id: MovieId,
    currently_liked: bool,
) -> Result<bool, ActionError> {
    let (resource, action) = if currently_liked {
        (Resource::delete("/unlike_movie"), "unlike movie")
    } else {
        (Resource::post("/like_movie"), "like movie")
    };
    let resource = resource
        .query("user_id", user_id)
        .query("movie_id", movie_id);

    fetcher
        .fetch(&resource)
        .await
        .map_err(ActionError::rejected(action))?;
    Ok(!currently_liked)
}

pub async fn like_review<F: Fetcher + ?Sized>(
    fetcher: &F,
    user_id: UserId,
    review_id: ReviewId,
) -> Result<(), ActionError> {
    let resource =
        Resource::post("/likes/").json(json!({"review_id": review_id, "user_id": user_id}));
    fetcher
        .fetch(&resource)
        .await
        .map_err(ActionError::rejected("like review"))?;
    Ok(())
}

pub async fn login<F: Fetcher + ?Sized>(
    fetcher: &F,
    email: &str,
    password: &str,
) -> Result<Session, ActionError> {
    let resource =
        Resource::post("/users/login").json(json!({"email": email, "password": password}));
    let payload = fetcher
        .fetch(&resource)
        .await
        .map_err(ActionError::rejected("log in"))?;
    Session::from_login_response(&payload)
        .ok_or_else(|| ActionError::UnexpectedResponse("login response has no user_id".into()))
}

pub async fn signup<F: Fetcher + ?Sized>(
    fetcher: &F,
    username: &str,
    email: &str,
    password: &str,
) -> Result<Value, ActionError> {
    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(ActionError::Invalid(
            "Username, email and password are required.".into(),
        ));
    }
    let resource = Resource::post("/users/signup")
        .json(json!({"username": username, "email": email, "password": password}));
    fetcher
        .fetch(&resource)
        .await
        .map_err(ActionError::rejected("sign up"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub title: String,
    pub content: String,
    pub rating: f64,
}

impl ReviewDraft {
    pub fn validate(&self) -> Result<(), ActionError> {
        if self.title.trim().is_empty() {
            return Err(ActionError::Invalid("Review title cannot be empty.".into()));
        }
        if !(0.0..=f64::from(MAX_REVIEW_RATING)).contains(&self.rating) {
            return Err(ActionError::Invalid(format!(
                "Rating must be a number between 0 and {MAX_REVIEW_RATING}."
            )));
        }
        Ok(())
    }
}

pub async fn submit_review<F: Fetcher + ?Sized>(
    fetcher: &F,
    user_id: UserId,
    movie_id: MovieId,
    draft: &ReviewDraft,
) -> Result<Value, ActionError> {
    draft.validate()?;
    let resource = Resource::post("/reviews/").json(json!({
        "movie_id": movie_id,
        "user_id": user_id,
        "title": draft.title,
        "content": draft.content,
        "rating": draft.rating,
    }));
    fetcher
        .fetch(&resource)
        .await
        .map_err(ActionError::rejected("submit review"))
}

/// Body of the add/update movie forms. List fields are sent as arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieDraft {
    pub title: String,
    pub info: String,
    pub critics_consensus: String,
    pub rating: String,
    pub in_theaters_date: String,
    pub on_streaming_date: String,
    pub runtime_in_minutes: u32,
    pub tomatometer_status: String,
    pub tomatometer_rating: f64,
    pub tomatometer_count: u64,
    pub audience_rating: f64,
    pub audience_count: u64,
    pub genres: Vec<String>,
    pub writers: Vec<String>,
    pub actors: Vec<String>,
    pub studios: Vec<String>,
    pub directors: Vec<String>,
}

/// Splits a comma-separated form field into trimmed, non-empty names.
pub fn split_list(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn movie_body(draft: &MovieDraft) -> Result<Value, ActionError> {
    if draft.title.trim().is_empty() {
        return Err(ActionError::Invalid("Movie title cannot be empty.".into()));
    }
    serde_json::to_value(draft).map_err(|e| ActionError::Invalid(e.to_string()))
}

pub async fn create_movie<F: Fetcher + ?Sized>(
    fetcher: &F,
    draft: &MovieDraft,
) -> Result<Value, ActionError> {
    let resource = Resource::post("/movies/").json(movie_body(draft)?);
    fetcher
        .fetch(&resource)
        .await
        .map_err(ActionError::rejected("add movie"))
}

pub async fn update_movie<F: Fetcher + ?Sized>(
    fetcher: &F,
    movie_id: MovieId,
    draft: &MovieDraft,
) -> Result<Value, ActionError> {
    let resource = Resource::put(format!("/movies/{movie_id}")).json(movie_body(draft)?);
    fetcher
        .fetch(&resource)
        .await
        .map_err(ActionError::rejected("update movie"))
}

pub async fn delete_movie<F: Fetcher + ?Sized>(
    fetcher: &F,
    movie_id: MovieId,
) -> Result<(), ActionError> {
    fetcher
        .fetch(&Resource::delete(format!("/movies/{movie_id}")))
        .await
        .map_err(ActionError::rejected("delete movie"))?;
    Ok(())
}
