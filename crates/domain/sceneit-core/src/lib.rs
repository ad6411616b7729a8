use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod envelope;
pub mod outcome;
pub mod resource;
pub mod spec;
pub mod view;

pub use outcome::{FailureKind, LoadFailure, RequestOutcome};
pub use resource::{Method, Resource};
pub use spec::{validate, Derived, RequestPlan, RequestSpec, SpecError, SpecKey};
pub use view::{Generation, SettleResult, ViewEntry, ViewModel};

pub type MovieId = i64;
pub type ReviewId = i64;
pub type UserId = i64;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Movie {
    pub movie_id: Option<MovieId>,
    pub title: Option<String>,
    pub info: Option<String>,
    pub critics_consensus: Option<String>,
    pub rating: Option<String>,
    pub in_theaters_date: Option<String>,
    pub on_streaming_date: Option<String>,
    pub runtime_in_minutes: Option<f64>,
    pub tomatometer_status: Option<String>,
    pub tomatometer_rating: Option<f64>,
    pub tomatometer_count: Option<u64>,
    pub audience_rating: Option<f64>,
    pub audience_count: Option<u64>,
    pub genres: Option<Vec<String>>,
    pub directors: Option<Vec<String>>,
    pub writers: Option<Vec<String>>,
    pub studios: Option<Vec<String>>,
    pub actors: Option<Vec<String>>,
    pub review_count: Option<u64>,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Review {
    pub review_id: Option<ReviewId>,
    pub movie_id: Option<MovieId>,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub rating: Option<f64>,
    pub created_at: Option<String>,
    pub like_count: Option<u64>,
}

impl Review {
    /// `/reviews/{id}` answers `{review: {...}}`; listings answer the bare row.
    pub fn from_payload(value: &Value) -> Option<Review> {
        let inner = value.get("review").unwrap_or(value);
        if !inner.is_object() {
            return None;
        }
        serde_json::from_value(inner.clone()).ok()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserSummary {
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub total_likes: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimilarUser {
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub mutual_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LikedMovie {
    pub movie_id: Option<MovieId>,
    pub title: Option<String>,
    pub liked_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Reputation {
    pub reputation_score: Option<f64>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionUser {
    pub user_id: UserId,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// The persisted `authUser` blob. Opaque to the loader apart from the user id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
    pub user: SessionUser,
}

impl Session {
    /// Accepts `{user_id, ...}` or `{user: {user_id, ...}}`, with the token
    /// under `token` or `access_token`.
    pub fn from_login_response(value: &Value) -> Option<Session> {
        let user_value = match value.get("user") {
            Some(u) if u.get("user_id").is_some() => u,
            _ => value,
        };
        let user_id = user_value.get("user_id").and_then(Value::as_i64)?;
        let text = |v: &Value, field: &str| v.get(field).and_then(Value::as_str).map(str::to_string);

        Some(Session {
            token: text(value, "token").or_else(|| text(value, "access_token")),
            user: SessionUser {
                user_id,
                username: text(user_value, "username"),
                email: text(user_value, "email"),
            },
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user.user_id
    }
}
