use crate::domain::{AppState, ItemRef, Notice};

use super::events::DomainEvent;

pub fn reduce(mut state: AppState, ev: DomainEvent) -> AppState {
    match ev {
        DomainEvent::RouteChanged(r) => {
            // A fresh load supersedes per-item overrides from the previous screen.
            state.route = r;
            state.movie_likes.clear();
            state.review_like_bumps.clear();
            state.item_errors.clear();
        }

        DomainEvent::QueryChanged(q) => {
            state.query = q;
            state.table.page = 0;
        }
        DomainEvent::TableFilterChanged(filter) => {
            state.table.filter = filter;
            state.table.page = 0;
        }
        DomainEvent::TablePageChanged(page) => state.table.page = page,
        DomainEvent::TablePageSizeChanged(size) => {
            state.table.page_size = sceneit_config::clamp_page_size(size);
            state.table.page = 0;
        }

        DomainEvent::SessionChanged(session) => state.session = session,

        DomainEvent::ItemActionStarted(item) => {
            state.busy.insert(item);
            state.item_errors.remove(&item);
        }
        DomainEvent::MovieLikeSettled { movie_id, liked } => {
            let item = ItemRef::Movie(movie_id);
            state.busy.remove(&item);
            state.item_errors.remove(&item);
            state.movie_likes.insert(movie_id, liked);
        }
        DomainEvent::ReviewLikeSettled(review_id) => {
            let item = ItemRef::Review(review_id);
            state.busy.remove(&item);
            state.item_errors.remove(&item);
            *state.review_like_bumps.entry(review_id).or_insert(0) += 1;
        }
        DomainEvent::ItemError { item, message } => {
            state.busy.remove(&item);
            state.item_errors.insert(item, message);
        }

        DomainEvent::LoginSettled {
            result: Ok(session),
            ..
        } => {
            state.session = Some(session);
            state.notice = None;
        }
        DomainEvent::SignupSettled(Ok(())) => {
            state.notice = Some(Notice::Info(
                "Account created. Please log in.".into(),
            ));
        }
        DomainEvent::ReviewSubmitted { result: Ok(()), .. } => {
            state.notice = Some(Notice::Info("Review submitted.".into()));
        }
        DomainEvent::MovieSaved(Ok(message)) => state.notice = Some(Notice::Info(message)),
        DomainEvent::LoginSettled {
            result: Err(message),
            ..
        }
        | DomainEvent::SignupSettled(Err(message))
        | DomainEvent::MovieSaved(Err(message))
        | DomainEvent::ReviewSubmitted {
            result: Err(message),
            ..
        } => state.notice = Some(Notice::Error(message)),

        DomainEvent::Notice(n) => state.notice = Some(n),
        DomainEvent::NoticeCleared => state.notice = None,
    }
    state
}
