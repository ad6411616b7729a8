use sceneit_core::{MovieId, ReviewId, Session};

use crate::domain::{ItemRef, MovieQuery, Notice, Route};

#[derive(Debug, Clone)]
pub enum DomainEvent {
    // Navigation
    RouteChanged(Route),
    QueryChanged(MovieQuery),
    TableFilterChanged(String),
    TablePageChanged(usize),
    TablePageSizeChanged(usize),

    // Session
    SessionChanged(Option<Session>),

    // Item actions
    ItemActionStarted(ItemRef),
    MovieLikeSettled { movie_id: MovieId, liked: bool },
    ReviewLikeSettled(ReviewId),
    ItemError { item: ItemRef, message: String },

    // Form actions
    /// `epoch` is the logout count when the login was issued.
    LoginSettled {
        epoch: u64,
        result: Result<Session, String>,
    },
    SignupSettled(Result<(), String>),
    ReviewSubmitted {
        movie_id: MovieId,
        result: Result<(), String>,
    },
    /// Confirmation text on success.
    MovieSaved(Result<String, String>),

    // Page-level feedback
    Notice(Notice),
    NoticeCleared,
}

impl DomainEvent {
    /// True for the last event a spawned action sends.
    pub fn completes_action(&self) -> bool {
        matches!(
            self,
            DomainEvent::MovieLikeSettled { .. }
                | DomainEvent::ReviewLikeSettled(_)
                | DomainEvent::ItemError { .. }
                | DomainEvent::LoginSettled { .. }
                | DomainEvent::SignupSettled(_)
                | DomainEvent::ReviewSubmitted { .. }
                | DomainEvent::MovieSaved(_)
        )
    }
}
