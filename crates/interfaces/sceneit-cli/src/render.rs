//! Plain-text rendering of each screen. Every section renders on its own,
//! so one failed request shows as one error line.

use sceneit_app_core::{
    AppState, ExploreVm, MovieDetailVm, MovieTableVm, Notice, ProfileVm, ReviewsVm, Route,
    Section,
};
use sceneit_core::{Movie, Review, ViewModel};

fn section<T>(
    lines: &mut Vec<String>,
    title: &str,
    s: &Section<T>,
    body: impl FnOnce(&T) -> Vec<String>,
) {
    lines.push(format!(":: {title}"));
    match s {
        Section::Loading => lines.push("   Loading...".into()),
        Section::Failed(e) => lines.push(format!("   Error: {e}")),
        Section::Ready(v) => {
            let rows = body(v);
            if rows.is_empty() {
                lines.push("   (none)".into());
            }
            lines.extend(rows.into_iter().map(|r| format!("   {r}")));
        }
    }
}

fn score(v: Option<f64>) -> String {
    match v {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v:.1}"),
        None => "-".into(),
    }
}

fn movie_line(m: &Movie) -> String {
    let id = m.movie_id.map(|id| format!("#{id} ")).unwrap_or_default();
    let title = m.title.as_deref().unwrap_or("(untitled)");
    let mut line = format!("{id}{title}");
    if let Some(r) = m.tomatometer_rating {
        line.push_str(&format!("  tomatometer {}", score(Some(r))));
    }
    if let Some(n) = m.review_count {
        line.push_str(&format!("  {n} reviews"));
    }
    if let Some(avg) = m.average_rating {
        line.push_str(&format!("  avg {}", score(Some(avg))));
    }
    line
}

fn review_line(r: &Review) -> String {
    let id = r.review_id.map(|id| format!("#{id} ")).unwrap_or_default();
    format!(
        "{id}{} ({}) by {}",
        r.title.as_deref().unwrap_or("(untitled)"),
        score(r.rating),
        r.username.as_deref().unwrap_or("anonymous"),
    )
}

pub fn explore(vm: &ExploreVm) -> String {
    let mut lines = Vec::new();
    let movies = |list: &Vec<Movie>| -> Vec<String> { list.iter().map(movie_line).collect() };
    section(&mut lines, "Top Reviewed", &vm.top_reviewed, movies);
    section(&mut lines, "Worst Rated", &vm.worst, movies);
    section(&mut lines, "Best Rated", &vm.best, movies);
    section(&mut lines, "Top Liked Users", &vm.top_liked_users, |users| {
        users
            .iter()
            .map(|u| {
                format!(
                    "{} ({} likes)",
                    u.username.as_deref().unwrap_or("unknown"),
                    u.total_likes.unwrap_or(0)
                )
            })
            .collect()
    });
    lines.join("\n")
}

pub fn profile(vm: &ProfileVm) -> String {
    let mut lines = vec![vm.title.clone()];
    section(&mut lines, "Reviews", &vm.reviews, |rs| {
        rs.iter().map(review_line).collect()
    });
    section(&mut lines, "Liked Reviews", &vm.liked_reviews, |rs| {
        rs.iter().map(review_line).collect()
    });
    section(&mut lines, "Similar Taste", &vm.similar_users, |users| {
        users
            .iter()
            .map(|u| {
                format!(
                    "{} ({} movies in common)",
                    u.username.as_deref().unwrap_or("unknown"),
                    u.mutual_count.unwrap_or(0)
                )
            })
            .collect()
    });
    section(&mut lines, "Reputation", &vm.reputation, |rep| {
        vec![format!("score {}", score(rep.reputation_score))]
    });
    section(&mut lines, "Liked Movies", &vm.liked_movies, |movies| {
        movies
            .iter()
            .map(|m| m.title.clone().unwrap_or_else(|| "(untitled)".into()))
            .collect()
    });
    lines.join("\n")
}

pub fn movie_detail(vm: &MovieDetailVm) -> String {
    let mut lines = Vec::new();
    section(&mut lines, "Movie", &vm.movie, |m| {
        let mut rows = vec![movie_line(m)];
        if let Some(info) = m.info.as_deref() {
            rows.push(info.to_string());
        }
        if let Some(consensus) = m.critics_consensus.as_deref() {
            rows.push(format!("Critics: {consensus}"));
        }
        if let Some(genres) = m.genres.as_ref().filter(|g| !g.is_empty()) {
            rows.push(format!("Genres: {}", genres.join(", ")));
        }
        if let Some(directors) = m.directors.as_ref().filter(|d| !d.is_empty()) {
            rows.push(format!("Directed by: {}", directors.join(", ")));
        }
        rows
    });
    lines.push(format!("   In theaters: {}", vm.released));
    lines.push(format!("   Streaming:   {}", vm.streaming));
    if let Some(like) = &vm.like {
        let mut line = format!("   {}", if like.liked { "♥ Liked" } else { "♡ Not liked" });
        if like.busy {
            line.push_str(" (saving...)");
        }
        if let Some(e) = &like.error {
            line.push_str(&format!("  [{e}]"));
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn reviews(vm: &ReviewsVm) -> String {
    let mut lines = vec![format!("Reviews for {}", vm.movie_title)];
    section(&mut lines, "Reviews", &vm.reviews, |rows| {
        rows.iter()
            .map(|row| {
                let mut line = format!(
                    "{}  {} likes  posted {}",
                    review_line(&row.review),
                    row.likes,
                    row.posted
                );
                if let Some(e) = &row.error {
                    line.push_str(&format!("  [{e}]"));
                }
                line
            })
            .collect()
    });
    lines.join("\n")
}

pub fn table(vm: &MovieTableVm) -> String {
    let mut lines = Vec::new();
    section(&mut lines, "Movies", &vm.table, |page| {
        let mut rows: Vec<String> = page.rows.iter().map(movie_line).collect();
        rows.push(format!(
            "page {}/{} ({} per page, {} matching)",
            page.page + 1,
            page.page_count,
            page.page_size,
            page.matched
        ));
        rows
    });
    lines.join("\n")
}

/// Renders whatever screen the kernel is on, notice first.
pub fn screen(view: &ViewModel, state: &AppState) -> String {
    let body = match &state.route {
        Route::Explore => explore(&ExploreVm::from_view(view)),
        Route::MovieTable | Route::Search => table(&MovieTableVm::from_view(view, &state.table)),
        Route::Movie(_) => movie_detail(&MovieDetailVm::from_view(view, state)),
        Route::WriteReview(_) => {
            let vm = MovieDetailVm::from_view(view, state);
            let title = vm
                .movie
                .ready()
                .and_then(|m| m.title.clone())
                .unwrap_or_else(|| "(Unknown Movie)".into());
            format!("Write a review for {title}")
        }
        Route::ViewReviews(_) => reviews(&ReviewsVm::from_view(view, state)),
        Route::Profile(id) => profile(&ProfileVm::from_view(id, view)),
        Route::Login => "Log in with your email and password.".into(),
        Route::Signup => "Create an account with a username, email and password.".into(),
    };
    match &state.notice {
        Some(Notice::Info(msg)) => format!("{msg}\n{body}"),
        Some(Notice::Error(msg)) => format!("Error: {msg}\n{body}"),
        None => body,
    }
}
