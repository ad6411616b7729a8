use std::future::Future;
use std::sync::Arc;

use sceneit_core::{Session, SpecKey, ViewModel};
use sceneit_infra::Fetcher;
use sceneit_persistence::SessionStore;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::actions::{self, ActionError};
use crate::app_core::{AppCommand, AppStore, DomainEvent};
use crate::domain::{AppState, ItemRef, MovieQuery, Notice, Route};
use crate::loader::{LoaderOptions, ViewLoader};
use crate::screens;
use crate::viewmodel::liked_from_view;

pub struct AppKernel<F, S> {
    pub store: AppStore,
    loader: ViewLoader<F>,
    fetcher: Arc<F>,
    sessions: Arc<S>,
    pending_actions: usize,
    /// Bumped on every logout; a login issued before it is not persisted.
    logouts: u64,

    tx: mpsc::UnboundedSender<DomainEvent>,
    rx: mpsc::UnboundedReceiver<DomainEvent>,
}

enum Wake {
    View(Option<SpecKey>),
    Action(Option<DomainEvent>),
}

impl<F, S> AppKernel<F, S>
where
    F: Fetcher,
    S: SessionStore,
{
    pub fn new(fetcher: Arc<F>, sessions: Arc<S>, options: LoaderOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            store: AppStore::default(),
            loader: ViewLoader::new(fetcher.clone(), options),
            fetcher,
            sessions,
            pending_actions: 0,
            logouts: 0,
            tx,
            rx,
        }
    }

    /// Enters `route` as the first screen.
    pub fn boot(&mut self, route: Route) {
        self.enter(route);
    }

    pub fn dispatch(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::Navigate(route) => {
                if route == Route::MovieTable {
                    self.store
                        .apply(DomainEvent::QueryChanged(MovieQuery::default()));
                }
                self.store.apply(DomainEvent::NoticeCleared);
                self.enter(route);
            }

            AppCommand::Reload => {
                let route = self.store.state().route;
                self.enter(route);
            }

            AppCommand::Search(query) => {
                self.store.apply(DomainEvent::QueryChanged(query));
                self.store.apply(DomainEvent::NoticeCleared);
                self.enter(Route::Search);
            }

            AppCommand::SetTableFilter(f) => self.store.apply(DomainEvent::TableFilterChanged(f)),
            AppCommand::SetTablePage(p) => self.store.apply(DomainEvent::TablePageChanged(p)),
            AppCommand::SetTablePageSize(s) => {
                self.store.apply(DomainEvent::TablePageSizeChanged(s))
            }

            AppCommand::ToggleMovieLike(movie_id) => {
                let item = ItemRef::Movie(movie_id);
                let Some(user_id) = self.begin_item_action(item, "like movies") else {
                    return;
                };
                // The loaded like status only describes the movie on screen.
                let on_movie = self
                    .store
                    .select(|s| s.route == Route::Movie(movie_id.to_string()));
                let known = self
                    .store
                    .select(|s| s.movie_likes.get(&movie_id).copied())
                    .or_else(|| {
                        on_movie
                            .then(|| liked_from_view(&self.loader.view()))
                            .flatten()
                    });
                let Some(currently_liked) = known else {
                    self.store.apply(DomainEvent::ItemError {
                        item,
                        message: "Like status is not loaded yet.".into(),
                    });
                    return;
                };

                let fetcher = self.fetcher.clone();
                self.spawn_action(async move {
                    match actions::like_toggle(&*fetcher, user_id, movie_id, currently_liked)
                        .await
                    {
                        Ok(liked) => DomainEvent::MovieLikeSettled { movie_id, liked },
                        Err(e) => DomainEvent::ItemError {
                            item,
                            message: e.to_string(),
                        },
                    }
                });
            }

            AppCommand::LikeReview(review_id) => {
                let item = ItemRef::Review(review_id);
                let Some(user_id) = self.begin_item_action(item, "like reviews") else {
                    return;
                };
                let fetcher = self.fetcher.clone();
                self.spawn_action(async move {
                    match actions::like_review(&*fetcher, user_id, review_id).await {
                        Ok(()) => DomainEvent::ReviewLikeSettled(review_id),
                        Err(e) => DomainEvent::ItemError {
                            item,
                            message: e.to_string(),
                        },
                    }
                });
            }

            AppCommand::Login { email, password } => {
                self.store.apply(DomainEvent::NoticeCleared);
                let fetcher = self.fetcher.clone();
                let epoch = self.logouts;
                self.spawn_action(async move {
                    let res = actions::login(&*fetcher, &email, &password).await;
                    DomainEvent::LoginSettled {
                        epoch,
                        result: res.map_err(|e| e.to_string()),
                    }
                });
            }

            AppCommand::Signup {
                username,
                email,
                password,
            } => {
                self.store.apply(DomainEvent::NoticeCleared);
                let fetcher = self.fetcher.clone();
                self.spawn_action(async move {
                    let res = actions::signup(&*fetcher, &username, &email, &password).await;
                    DomainEvent::SignupSettled(res.map(|_| ()).map_err(|e| e.to_string()))
                });
            }

            AppCommand::Logout => {
                self.logouts += 1;
                if let Err(e) = self.sessions.clear() {
                    warn!("Failed to clear stored session: {}", e);
                }
                self.store.apply(DomainEvent::SessionChanged(None));
                self.store.apply(DomainEvent::NoticeCleared);
                self.enter(Route::Login);
            }

            AppCommand::SubmitReview { movie_id, draft } => {
                let Some(session) = self.read_session() else {
                    self.notify_error(ActionError::NotAuthenticated("write a review"));
                    return;
                };
                if let Err(e) = draft.validate() {
                    self.notify_error(e);
                    return;
                }
                self.store.apply(DomainEvent::NoticeCleared);
                let fetcher = self.fetcher.clone();
                let user_id = session.user_id();
                self.spawn_action(async move {
                    let res =
                        actions::submit_review(&*fetcher, user_id, movie_id, &draft).await;
                    DomainEvent::ReviewSubmitted {
                        movie_id,
                        result: res.map(|_| ()).map_err(|e| e.to_string()),
                    }
                });
            }

            AppCommand::CreateMovie(draft) => {
                self.store.apply(DomainEvent::NoticeCleared);
                let fetcher = self.fetcher.clone();
                self.spawn_action(async move {
                    let res = actions::create_movie(&*fetcher, &draft).await;
                    DomainEvent::MovieSaved(
                        res.map(|_| format!("Movie '{}' added.", draft.title.trim()))
                            .map_err(|e| e.to_string()),
                    )
                });
            }

            AppCommand::UpdateMovie { movie_id, draft } => {
                self.store.apply(DomainEvent::NoticeCleared);
                let fetcher = self.fetcher.clone();
                self.spawn_action(async move {
                    let res = actions::update_movie(&*fetcher, movie_id, &draft).await;
                    DomainEvent::MovieSaved(
                        res.map(|_| format!("Movie #{movie_id} updated."))
                            .map_err(|e| e.to_string()),
                    )
                });
            }

            AppCommand::DeleteMovie(movie_id) => {
                self.store.apply(DomainEvent::NoticeCleared);
                let fetcher = self.fetcher.clone();
                self.spawn_action(async move {
                    let res = actions::delete_movie(&*fetcher, movie_id).await;
                    DomainEvent::MovieSaved(
                        res.map(|()| format!("Movie #{movie_id} deleted."))
                            .map_err(|e| e.to_string()),
                    )
                });
            }
        }
    }

    /// Applies settled requests and finished actions without waiting.
    pub fn tick(&mut self) {
        self.loader.tick();
        while let Ok(ev) = self.rx.try_recv() {
            self.handle_event(ev);
        }
    }

    /// Waits until the current load and every in-flight action have settled.
    pub async fn settle(&mut self) {
        loop {
            self.tick();
            let view_done = self.loader.view().all_settled();
            let acting = self.pending_actions > 0;
            if view_done && !acting {
                return;
            }
            let wake = tokio::select! {
                key = self.loader.next_settled(), if !view_done => Wake::View(key),
                ev = self.rx.recv(), if acting => Wake::Action(ev),
            };
            match wake {
                Wake::View(key) => {
                    if let Some(key) = key {
                        debug!("'{}' settled", key);
                    }
                }
                Wake::Action(Some(ev)) => self.handle_event(ev),
                Wake::Action(None) => return,
            }
        }
    }

    pub fn view(&self) -> ViewModel {
        self.loader.view()
    }

    pub fn state(&self) -> AppState {
        self.store.state()
    }

    /// The session as stored right now, which may differ from the one read at screen entry.
    pub fn session(&self) -> Option<Session> {
        self.read_session()
    }

    /// Reads the stored session at screen entry, then starts the screen's load.
    fn enter(&mut self, route: Route) {
        let session = self.read_session();
        self.store.apply(DomainEvent::SessionChanged(session.clone()));
        self.store.apply(DomainEvent::RouteChanged(route.clone()));

        let specs = match &route {
            Route::MovieTable | Route::Search => {
                screens::search_specs(&self.store.state().query)
            }
            other => screens::specs_for(other, session.as_ref()),
        };
        info!("Entering {}", route);
        if let Err(e) = self.loader.load(specs) {
            self.store.apply(DomainEvent::Notice(Notice::Error(format!(
                "Cannot load {route}: {e}"
            ))));
        }
    }

    fn read_session(&self) -> Option<Session> {
        match self.sessions.get() {
            Ok(session) => session,
            Err(e) => {
                warn!("Stored session unreadable, treating as logged out: {}", e);
                None
            }
        }
    }

    /// Marks `item` busy and returns the acting user, or records why it cannot start.
    fn begin_item_action(&mut self, item: ItemRef, what: &'static str) -> Option<i64> {
        if self.store.select(|s| s.busy.contains(&item)) {
            debug!("{:?} already in flight", item);
            return None;
        }
        let Some(session) = self.read_session() else {
            self.store.apply(DomainEvent::ItemError {
                item,
                message: ActionError::NotAuthenticated(what).to_string(),
            });
            return None;
        };
        self.store.apply(DomainEvent::ItemActionStarted(item));
        Some(session.user_id())
    }

    fn notify_error(&self, e: ActionError) {
        self.store
            .apply(DomainEvent::Notice(Notice::Error(e.to_string())));
    }

    fn spawn_action<Fut>(&mut self, fut: Fut)
    where
        Fut: Future<Output = DomainEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        let task = async move {
            let _ = tx.send(fut.await);
        };
        match crate::async_runtime::spawn(task) {
            Ok(()) => self.pending_actions += 1,
            Err(e) => self.store.apply(DomainEvent::Notice(Notice::Error(format!(
                "Failed to start action: {e}"
            )))),
        }
    }

    fn handle_event(&mut self, ev: DomainEvent) {
        if ev.completes_action() {
            self.pending_actions = self.pending_actions.saturating_sub(1);
        }
        if let DomainEvent::LoginSettled { epoch, result } = &ev {
            if *epoch != self.logouts {
                info!("Discarding a login that finished after logout");
                return;
            }
            if let Ok(session) = result {
                if let Err(e) = self.sessions.set(session) {
                    warn!("Failed to persist session: {}", e);
                }
            }
        }
        let follow_up = match &ev {
            DomainEvent::LoginSettled { result: Ok(_), .. } => {
                Some((Route::Login, Route::Explore))
            }
            DomainEvent::SignupSettled(Ok(())) => Some((Route::Signup, Route::Login)),
            DomainEvent::ReviewSubmitted {
                movie_id,
                result: Ok(()),
            } => Some((
                Route::WriteReview(movie_id.to_string()),
                Route::ViewReviews(movie_id.to_string()),
            )),
            _ => None,
        };
        self.store.apply(ev);

        // Only redirect when the user is still on the form that started the action.
        if let Some((from, to)) = follow_up {
            if self.store.select(|s| s.route == from) {
                self.enter(to);
            }
        }
    }
}
