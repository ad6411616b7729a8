use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use sceneit_app_core::actions::split_list;
use sceneit_app_core::{MovieDraft, MovieQuery, ReviewDraft, Route};
use sceneit_cli::{build_kernel, commands, ClientOptions};
use sceneit_core::{MovieId, ReviewId, UserId};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Base URL of the SceneIt REST API
    #[arg(long, global = true, env = "SCENEIT_API", default_value = sceneit_config::DEFAULT_API_ENDPOINT)]
    api: String,
    /// Per-request timeout; 0 waits forever
    #[arg(long, global = true, default_value_t = sceneit_config::DEFAULT_REQUEST_TIMEOUT_MS)]
    timeout_ms: u64,
    /// Session storage file (defaults to the platform config directory)
    #[arg(long, global = true)]
    session_file: Option<Utf8PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ranked lists: top reviewed, worst, best and most liked users
    Explore,
    /// The movie table, filtered and paged locally
    Movies {
        #[arg(short, long)]
        filter: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = sceneit_config::DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },
    Search {
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "genre")]
        genres: Vec<String>,
        #[arg(long = "writer")]
        writers: Vec<String>,
        #[arg(long = "actor")]
        actors: Vec<String>,
        #[arg(long = "studio")]
        studios: Vec<String>,
        #[arg(long = "director")]
        directors: Vec<String>,
        #[arg(long)]
        year: Option<i32>,
    },
    Movie {
        id: MovieId,
    },
    Reviews {
        movie_id: MovieId,
    },
    Profile {
        user_id: UserId,
    },
    /// Like a movie, or unlike it if already liked
    Like {
        movie_id: MovieId,
    },
    #[command(name = "like-review")]
    LikeReview {
        review_id: ReviewId,
    },
    /// Post a review rated 0-100
    Review {
        movie_id: MovieId,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        rating: f64,
    },
    #[command(name = "add-movie")]
    AddMovie(MovieForm),
    /// Replace a movie's fields with the given form
    #[command(name = "update-movie")]
    UpdateMovie {
        movie_id: MovieId,
        #[command(flatten)]
        form: MovieForm,
    },
    #[command(name = "delete-movie")]
    DeleteMovie {
        movie_id: MovieId,
    },
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
    Whoami,
    /// Render any router path, e.g. `/profile/7`
    Open {
        path: String,
    },
}

/// The add/update movie form. List fields are comma-separated.
#[derive(Args)]
struct MovieForm {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    info: String,
    #[arg(long, default_value = "")]
    critics_consensus: String,
    /// MPAA rating, e.g. `R`
    #[arg(long, default_value = "")]
    rating: String,
    #[arg(long, default_value = "")]
    in_theaters_date: String,
    #[arg(long, default_value = "")]
    on_streaming_date: String,
    #[arg(long, default_value_t = 0)]
    runtime_in_minutes: u32,
    #[arg(long, default_value = "")]
    tomatometer_status: String,
    #[arg(long, default_value_t = 0.0)]
    tomatometer_rating: f64,
    #[arg(long, default_value_t = 0)]
    tomatometer_count: u64,
    #[arg(long, default_value_t = 0.0)]
    audience_rating: f64,
    #[arg(long, default_value_t = 0)]
    audience_count: u64,
    #[arg(long, default_value = "")]
    genres: String,
    #[arg(long, default_value = "")]
    writers: String,
    #[arg(long, default_value = "")]
    actors: String,
    #[arg(long, default_value = "")]
    studios: String,
    #[arg(long, default_value = "")]
    directors: String,
}

impl From<MovieForm> for MovieDraft {
    fn from(form: MovieForm) -> Self {
        MovieDraft {
            title: form.title,
            info: form.info,
            critics_consensus: form.critics_consensus,
            rating: form.rating,
            in_theaters_date: form.in_theaters_date,
            on_streaming_date: form.on_streaming_date,
            runtime_in_minutes: form.runtime_in_minutes,
            tomatometer_status: form.tomatometer_status,
            tomatometer_rating: form.tomatometer_rating,
            tomatometer_count: form.tomatometer_count,
            audience_rating: form.audience_rating,
            audience_count: form.audience_count,
            genres: split_list(&form.genres),
            writers: split_list(&form.writers),
            actors: split_list(&form.actors),
            studios: split_list(&form.studios),
            directors: split_list(&form.directors),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")?;

    let mut kernel = build_kernel(&ClientOptions {
        api: cli.api,
        timeout_ms: cli.timeout_ms,
        session_file: cli.session_file,
    })?;

    let output = match cli.command {
        Commands::Explore => commands::cmd_open(&mut kernel, Route::Explore).await?,
        Commands::Movies {
            filter,
            page,
            page_size,
        } => commands::cmd_movies(&mut kernel, filter, page, page_size).await?,
        Commands::Search {
            title,
            genres,
            writers,
            actors,
            studios,
            directors,
            year,
        } => {
            let query = MovieQuery {
                title,
                genres,
                writers,
                actors,
                studios,
                directors,
                year,
            };
            commands::cmd_search(&mut kernel, query).await?
        }
        Commands::Movie { id } => {
            commands::cmd_open(&mut kernel, Route::Movie(id.to_string())).await?
        }
        Commands::Reviews { movie_id } => {
            commands::cmd_open(&mut kernel, Route::ViewReviews(movie_id.to_string())).await?
        }
        Commands::Profile { user_id } => {
            commands::cmd_open(&mut kernel, Route::Profile(user_id.to_string())).await?
        }
        Commands::Like { movie_id } => commands::cmd_like(&mut kernel, movie_id).await?,
        Commands::LikeReview { review_id } => {
            commands::cmd_like_review(&mut kernel, review_id).await?
        }
        Commands::Review {
            movie_id,
            title,
            content,
            rating,
        } => {
            let draft = ReviewDraft {
                title,
                content,
                rating,
            };
            commands::cmd_review(&mut kernel, movie_id, draft).await?
        }
        Commands::AddMovie(form) => commands::cmd_add_movie(&mut kernel, form.into()).await?,
        Commands::UpdateMovie { movie_id, form } => {
            commands::cmd_update_movie(&mut kernel, movie_id, form.into()).await?
        }
        Commands::DeleteMovie { movie_id } => {
            commands::cmd_delete_movie(&mut kernel, movie_id).await?
        }
        Commands::Login { email, password } => {
            commands::cmd_login(&mut kernel, email, password).await?
        }
        Commands::Signup {
            username,
            email,
            password,
        } => commands::cmd_signup(&mut kernel, username, email, password).await?,
        Commands::Logout => commands::cmd_logout(&mut kernel)?,
        Commands::Whoami => commands::cmd_whoami(&kernel)?,
        Commands::Open { path } => {
            let route = Route::parse(&path).with_context(|| format!("Unknown path '{path}'"))?;
            commands::cmd_open(&mut kernel, route).await?
        }
    };

    println!("{output}");
    Ok(())
}
