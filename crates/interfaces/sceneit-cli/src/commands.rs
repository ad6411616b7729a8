use std::time::Duration;

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use sceneit_app_core::{
    AppCommand, AppKernel, ItemRef, MovieDraft, MovieQuery, Notice, ReviewDraft, Route,
};
use sceneit_core::{MovieId, ReviewId};
use sceneit_infra::Fetcher;
use sceneit_persistence::SessionStore;

use crate::render;

async fn settle<F: Fetcher, S: SessionStore>(kernel: &mut AppKernel<F, S>, msg: &str) {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    kernel.settle().await;
    pb.finish_and_clear();
}

fn screen<F: Fetcher, S: SessionStore>(kernel: &AppKernel<F, S>) -> String {
    render::screen(&kernel.view(), &kernel.state())
}

fn page_error<F: Fetcher, S: SessionStore>(kernel: &AppKernel<F, S>) -> Option<String> {
    match kernel.state().notice {
        Some(Notice::Error(msg)) => Some(msg),
        _ => None,
    }
}

fn item_error<F: Fetcher, S: SessionStore>(
    kernel: &AppKernel<F, S>,
    item: ItemRef,
) -> Option<String> {
    kernel.state().item_errors.get(&item).cloned()
}

/// Enters `route`, waits for every section, and renders the screen.
pub async fn cmd_open<F: Fetcher, S: SessionStore>(
    kernel: &mut AppKernel<F, S>,
    route: Route,
) -> Result<String> {
    kernel.dispatch(AppCommand::Navigate(route.clone()));
    settle(kernel, &format!("Loading {route}")).await;
    Ok(screen(kernel))
}

pub async fn cmd_movies<F: Fetcher, S: SessionStore>(
    kernel: &mut AppKernel<F, S>,
    filter: Option<String>,
    page: usize,
    page_size: usize,
) -> Result<String> {
    kernel.dispatch(AppCommand::Navigate(Route::MovieTable));
    settle(kernel, "Loading movies").await;
    kernel.dispatch(AppCommand::SetTablePageSize(page_size));
    if let Some(filter) = filter {
        kernel.dispatch(AppCommand::SetTableFilter(filter));
    }
    kernel.dispatch(AppCommand::SetTablePage(page.saturating_sub(1)));
    Ok(screen(kernel))
}

pub async fn cmd_search<F: Fetcher, S: SessionStore>(
    kernel: &mut AppKernel<F, S>,
    query: MovieQuery,
) -> Result<String> {
    kernel.dispatch(AppCommand::Search(query));
    settle(kernel, "Searching").await;
    Ok(screen(kernel))
}

pub async fn cmd_like<F: Fetcher, S: SessionStore>(
    kernel: &mut AppKernel<F, S>,
    movie_id: MovieId,
) -> Result<String> {
    kernel.dispatch(AppCommand::Navigate(Route::Movie(movie_id.to_string())));
    settle(kernel, "Loading movie").await;
    kernel.dispatch(AppCommand::ToggleMovieLike(movie_id));
    settle(kernel, "Saving").await;

    if let Some(e) = item_error(kernel, ItemRef::Movie(movie_id)) {
        bail!(e);
    }
    Ok(screen(kernel))
}

pub async fn cmd_like_review<F: Fetcher, S: SessionStore>(
    kernel: &mut AppKernel<F, S>,
    review_id: ReviewId,
) -> Result<String> {
    kernel.dispatch(AppCommand::LikeReview(review_id));
    settle(kernel, "Saving").await;

    if let Some(e) = item_error(kernel, ItemRef::Review(review_id)) {
        bail!(e);
    }
    Ok(format!("Liked review #{review_id}."))
}

pub async fn cmd_review<F: Fetcher, S: SessionStore>(
    kernel: &mut AppKernel<F, S>,
    movie_id: MovieId,
    draft: ReviewDraft,
) -> Result<String> {
    kernel.dispatch(AppCommand::Navigate(Route::WriteReview(movie_id.to_string())));
    settle(kernel, "Loading movie").await;
    kernel.dispatch(AppCommand::SubmitReview { movie_id, draft });
    settle(kernel, "Submitting review").await;

    if let Some(e) = page_error(kernel) {
        bail!(e);
    }
    Ok(screen(kernel))
}

pub async fn cmd_login<F: Fetcher, S: SessionStore>(
    kernel: &mut AppKernel<F, S>,
    email: String,
    password: String,
) -> Result<String> {
    kernel.dispatch(AppCommand::Navigate(Route::Login));
    kernel.dispatch(AppCommand::Login { email, password });
    settle(kernel, "Logging in").await;

    if let Some(e) = page_error(kernel) {
        bail!(e);
    }
    match kernel.state().session {
        Some(s) => Ok(format!(
            "Logged in as {} (user #{}).",
            s.user.username.as_deref().unwrap_or("unknown"),
            s.user_id()
        )),
        None => bail!("Login did not return a session"),
    }
}

pub async fn cmd_signup<F: Fetcher, S: SessionStore>(
    kernel: &mut AppKernel<F, S>,
    username: String,
    email: String,
    password: String,
) -> Result<String> {
    kernel.dispatch(AppCommand::Navigate(Route::Signup));
    kernel.dispatch(AppCommand::Signup {
        username,
        email,
        password,
    });
    settle(kernel, "Signing up").await;

    if let Some(e) = page_error(kernel) {
        bail!(e);
    }
    Ok(screen(kernel))
}

async fn movie_form<F: Fetcher, S: SessionStore>(
    kernel: &mut AppKernel<F, S>,
    cmd: AppCommand,
    msg: &str,
) -> Result<String> {
    kernel.dispatch(cmd);
    settle(kernel, msg).await;
    match kernel.state().notice {
        Some(Notice::Info(done)) => Ok(done),
        Some(Notice::Error(e)) => bail!(e),
        None => bail!("The backend did not confirm the change"),
    }
}

pub async fn cmd_add_movie<F: Fetcher, S: SessionStore>(
    kernel: &mut AppKernel<F, S>,
    draft: MovieDraft,
) -> Result<String> {
    movie_form(kernel, AppCommand::CreateMovie(draft), "Adding movie").await
}

pub async fn cmd_update_movie<F: Fetcher, S: SessionStore>(
    kernel: &mut AppKernel<F, S>,
    movie_id: MovieId,
    draft: MovieDraft,
) -> Result<String> {
    movie_form(
        kernel,
        AppCommand::UpdateMovie { movie_id, draft },
        "Updating movie",
    )
    .await
}

pub async fn cmd_delete_movie<F: Fetcher, S: SessionStore>(
    kernel: &mut AppKernel<F, S>,
    movie_id: MovieId,
) -> Result<String> {
    movie_form(kernel, AppCommand::DeleteMovie(movie_id), "Deleting movie").await
}

pub fn cmd_logout<F: Fetcher, S: SessionStore>(kernel: &mut AppKernel<F, S>) -> Result<String> {
    kernel.dispatch(AppCommand::Logout);
    Ok("Logged out.".into())
}

pub fn cmd_whoami<F: Fetcher, S: SessionStore>(kernel: &AppKernel<F, S>) -> Result<String> {
    Ok(match kernel.session() {
        Some(s) => format!(
            "{} <{}> (user #{})",
            s.user.username.as_deref().unwrap_or("unknown"),
            s.user.email.as_deref().unwrap_or("no email"),
            s.user_id()
        ),
        None => "Not logged in.".into(),
    })
}
