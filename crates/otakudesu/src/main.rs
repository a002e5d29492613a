//! otakudesu browser CLI.

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand, ValueEnum};
use otakudesu::api::ScheduleDay;
use otakudesu::home::{day_name, parse_day};
use otakudesu::{
    CatalogSource, DetailLoader, HomeFeed, ListResource, LoadOutcome, OtakudesuClient,
    PagedListLoader, SearchLoader,
};
use shared::{AnimeSummary, Config, DataPaths, DuplicatePolicy, FavoritesStore, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the featured banner and the latest ongoing and completed anime
    Home,
    /// Show the release schedule for one day (today by default)
    Schedule {
        /// Day name, e.g. "Senin" or "monday"
        #[arg(short, long)]
        day: Option<String>,
    },
    /// List all genres
    Genres,
    /// Search anime by title
    Search { keyword: String },
    /// Show the detail of one anime
    Detail { anime_id: String },
    /// Browse a paged list
    List {
        #[arg(value_enum)]
        kind: ListKind,

        /// Genre id, required for the genre list
        #[arg(short, long)]
        genre: Option<String>,

        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ListKind {
    Completed,
    Ongoing,
    Genre,
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    /// List saved favorites
    List,
    /// Fetch an anime and add it to favorites
    Add { anime_id: String },
    /// Remove every favorite with this id
    Remove { anime_id: String },
    /// Tell whether an anime is a favorite
    Check { anime_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level()
    };

    let data_paths = DataPaths::from_config(&config);

    shared::logging::init(shared::LogConfig {
        log_dir: data_paths.logs_dir().to_string_lossy().to_string(),
        component: "otakudesu".to_string(),
        default_level: log_level,
        console: config.logging.console,
        file: config.logging.file,
        json_format: config.logging.json_format,
    })?;

    info!(config_file = %args.config.display(), "otakudesu starting");

    // Initialize data paths
    data_paths
        .create_dirs()
        .context("Failed to create data directories")?;

    let api = Arc::new(OtakudesuClient::from_config(&config.api).context("Failed to create API client")?);
    debug!(base_url = api.base_url(), "API client ready");

    // Cancelled on Ctrl-C; every loader hangs off it
    let session = CancellationToken::new();
    let interrupt = session.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    match args.command {
        Command::Home => home(api, &session).await,
        Command::Schedule { day } => schedule(api, &session, day.as_deref()).await,
        Command::Genres => genres(api, &session).await,
        Command::Search { keyword } => search(api, &session, keyword).await,
        Command::Detail { anime_id } => detail(api, &session, anime_id).await,
        Command::List { kind, genre, pages } => {
            let resource = match (kind, genre) {
                (ListKind::Completed, _) => ListResource::Completed,
                (ListKind::Ongoing, _) => ListResource::Ongoing,
                (ListKind::Genre, Some(genre_id)) => ListResource::genre(genre_id),
                (ListKind::Genre, None) => bail!("--genre is required for the genre list"),
            };
            list(api, &session, &config, resource, pages).await
        }
        Command::Favorites { action } => {
            favorites(api, &session, &config, &data_paths, action).await
        }
    }
}

async fn home(api: Arc<OtakudesuClient>, session: &CancellationToken) -> Result<()> {
    let feed = HomeFeed::new(api).with_parent(session);
    let Some(sections) = feed.load().await?.ready() else {
        return Ok(());
    };

    println!("== Featured ==");
    print_summaries(&sections.banner);
    println!("\n== Ongoing ==");
    print_summaries(&sections.ongoing);
    println!("\n== Completed ==");
    print_summaries(&sections.completed);

    if let Some(day) = sections.schedule_today() {
        println!();
        print_schedule(day);
    }

    Ok(())
}

async fn schedule(
    api: Arc<OtakudesuClient>,
    session: &CancellationToken,
    day: Option<&str>,
) -> Result<()> {
    let weekday = match day {
        Some(name) => match parse_day(name) {
            Some(weekday) => weekday,
            None => bail!("Unknown day: {}", name),
        },
        None => Local::now().weekday(),
    };

    let feed = HomeFeed::new(api).with_parent(session);
    let Some(sections) = feed.load().await?.ready() else {
        return Ok(());
    };

    match sections.schedule_for(weekday) {
        Some(day) => print_schedule(day),
        None => println!("No releases scheduled for {}", day_name(weekday)),
    }

    Ok(())
}

async fn genres(api: Arc<OtakudesuClient>, session: &CancellationToken) -> Result<()> {
    let feed = HomeFeed::new(api).with_parent(session);
    if let Some(sections) = feed.load().await?.ready() {
        for genre in &sections.genres {
            println!("{:<24} {}", genre.genre_id, genre.title);
        }
    }
    Ok(())
}

async fn search(api: Arc<OtakudesuClient>, session: &CancellationToken, keyword: String) -> Result<()> {
    let loader = SearchLoader::new(api, keyword).with_parent(session);
    if let Some(results) = loader.load().await?.ready() {
        if results.is_empty() {
            println!("No anime found for '{}'", loader.keyword());
        }
        print_summaries(&results);
    }
    Ok(())
}

async fn detail(api: Arc<OtakudesuClient>, session: &CancellationToken, anime_id: String) -> Result<()> {
    let loader = DetailLoader::new(api, anime_id).with_parent(session);
    let Some(detail) = loader.load().await?.ready() else {
        return Ok(());
    };

    println!("{}", detail.title);
    for (label, value) in [
        ("Japanese", &detail.japanese),
        ("Score", &detail.score),
        ("Type", &detail.anime_type),
        ("Status", &detail.status),
        ("Episodes", &detail.episodes),
        ("Duration", &detail.duration),
        ("Aired", &detail.aired),
        ("Studios", &detail.studios),
        ("Producers", &detail.producers),
    ] {
        if let Some(value) = value {
            println!("  {:<10} {}", label, value);
        }
    }

    if !detail.genre_list.is_empty() {
        let genres: Vec<&str> = detail.genre_list.iter().map(|g| g.title.as_str()).collect();
        println!("  {:<10} {}", "Genres", genres.join(", "));
    }

    let synopsis = detail.synopsis_text();
    if !synopsis.is_empty() {
        println!("\n{}", synopsis);
    }

    if !detail.episode_list.is_empty() {
        println!("\n{} episodes:", detail.episode_list.len());
        for episode in &detail.episode_list {
            println!("  {:<40} {}", episode.episode_id, episode.title.as_deref().unwrap_or(""));
        }
    }

    Ok(())
}

async fn list(
    api: Arc<OtakudesuClient>,
    session: &CancellationToken,
    config: &Config,
    resource: ListResource,
    pages: u32,
) -> Result<()> {
    let loader = PagedListLoader::new(CatalogSource::new(api, resource.clone()), resource)
        .with_parent(session)
        .with_threshold(config.browsing.load_more_threshold);

    if let LoadOutcome::Cancelled = loader.load(1, false).await? {
        return Ok(());
    }

    for _ in 1..pages {
        match loader.load_more().await? {
            LoadOutcome::Loaded { .. } => {}
            LoadOutcome::Skipped(reason) => {
                debug!(?reason, "Stopped loading more pages");
                break;
            }
            LoadOutcome::Cancelled => break,
        }
    }

    let snapshot = loader.snapshot();
    print_summaries(&snapshot.items);
    println!("\n{} anime, {}", snapshot.items.len(), snapshot.cursor);

    Ok(())
}

async fn favorites(
    api: Arc<OtakudesuClient>,
    session: &CancellationToken,
    config: &Config,
    data_paths: &DataPaths,
    action: FavoritesAction,
) -> Result<()> {
    let db_path = data_paths.favorites_db();
    info!(db_path = %db_path.display(), "Opening favorites database");
    let storage = SqliteStore::open(&db_path).context("Failed to open favorites database")?;
    let store = FavoritesStore::open(storage, DuplicatePolicy::from_dedupe(config.favorites.dedupe)).await;

    match action {
        FavoritesAction::List => {
            let entries = store.list();
            if entries.is_empty() {
                println!("No favorites yet");
            }
            for entry in entries {
                println!(
                    "{:<40} {}  (added {})",
                    entry.anime_id,
                    entry.title,
                    entry.added_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                );
            }
        }
        FavoritesAction::Add { anime_id } => {
            let loader = DetailLoader::new(api, anime_id).with_parent(session);
            if loader.load().await?.ready().is_none() {
                return Ok(());
            }
            let Some(summary) = loader.summary() else {
                return Ok(());
            };

            let added = store
                .add(&summary)
                .await
                .context("Failed to save favorites")?;
            if added {
                println!("Added {} to favorites", summary.title);
            } else {
                println!("{} is already a favorite", summary.title);
            }
        }
        FavoritesAction::Remove { anime_id } => {
            let removed = store
                .remove(&anime_id)
                .await
                .context("Failed to save favorites")?;
            if removed == 0 {
                println!("{} is not a favorite", anime_id);
            } else {
                println!("Removed {} from favorites", anime_id);
            }
        }
        FavoritesAction::Check { anime_id } => {
            let verdict = if store.contains(&anime_id) { "is" } else { "is not" };
            println!("{} {} a favorite", anime_id, verdict);
        }
    }

    Ok(())
}

fn print_summaries(items: &[AnimeSummary]) {
    for item in items {
        let mut extra = Vec::new();
        if let Some(episodes) = &item.episodes {
            extra.push(format!("{} eps", episodes));
        }
        if let Some(score) = &item.score {
            extra.push(format!("score {}", score));
        }
        if let Some(day) = &item.release_day {
            extra.push(day.clone());
        }

        if extra.is_empty() {
            println!("{:<40} {}", item.anime_id, item.title);
        } else {
            println!("{:<40} {} [{}]", item.anime_id, item.title, extra.join(", "));
        }
    }
}

fn print_schedule(day: &ScheduleDay) {
    println!("== {} ==", day.day);
    for anime in &day.anime_list {
        println!("{:<40} {}", anime.anime_id, anime.title);
    }
}
