use sceneit_core::{MovieId, ReviewId};

use crate::actions::{MovieDraft, ReviewDraft};
use crate::domain::{MovieQuery, Route};

#[derive(Debug, Clone)]
pub enum AppCommand {
    // Navigation
    Navigate(Route),
    Reload,

    // Movie table and search
    Search(MovieQuery),
    SetTableFilter(String),
    SetTablePage(usize),
    SetTablePageSize(usize),

    // Item actions
    ToggleMovieLike(MovieId),
    LikeReview(ReviewId),

    // Session
    Login {
        email: String,
        password: String,
    },
    Signup {
        username: String,
        email: String,
        password: String,
    },
    Logout,

    // Reviews
    SubmitReview {
        movie_id: MovieId,
        draft: ReviewDraft,
    },

    // Movie catalogue
    CreateMovie(MovieDraft),
    UpdateMovie {
        movie_id: MovieId,
        draft: MovieDraft,
    },
    DeleteMovie(MovieId),
}
