mod app;
mod cache;
mod catalog;
mod cli;
mod config;
mod engine;
mod planner;
mod spotify;
mod tables;
mod taste;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    app::{
        state::{AuthSession, ConnectedService, Mood},
        PlaylistSession,
    },
    cache::Cache,
    catalog::{
        local::{LocalLibrary, MemorySink},
        LibraryHistorySource, PlaylistSink, ShareSurface, TrackCatalog,
    },
    cli::Args,
    config::Config,
    engine::{EngineOptions, RecommendationEngine},
    spotify::{library::SpotifyLibrary, playlists::SpotifyPlaylists, search::SpotifyCatalog},
    tables::Tables,
};

struct StdoutShare;

impl ShareSurface for StdoutShare {
    fn present(&self, text: &str) {
        println!("{text}");
    }
}

/// Everything the connected music service contributes.
struct Backend {
    auth: AuthSession,
    catalog: Option<Arc<dyn TrackCatalog>>,
    history: Option<Arc<dyn LibraryHistorySource>>,
    sink: Option<Arc<dyn PlaylistSink>>,
}

impl Backend {
    fn offline() -> Self {
        Backend {
            auth: AuthSession::anonymous(),
            catalog: None,
            history: None,
            sink: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.list_moods {
        for mood in Mood::iter() {
            println!("{}", mood.to_string().to_lowercase());
        }
        return Ok(());
    }

    // ── Load config ───────────────────────────────────────────────────────────
    let config = Config::load()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    init_logging(&config)?;

    let tables = match &config.tables_path {
        Some(path) => Tables::load(path)?,
        None => Tables::builtin()?,
    };

    // ── Connect the music service (falls back to offline) ───────────────────
    let backend = connect_backend(&config).await;
    info!(
        "Connected service: {} (user: {})",
        backend.auth.connected_service,
        if backend.auth.user_name.is_empty() { "anonymous" } else { backend.auth.user_name.as_str() }
    );

    let options = EngineOptions {
        query_timeout: config.query_timeout,
        ..EngineOptions::default()
    };
    let mut engine = RecommendationEngine::new(tables, backend.catalog.clone()).with_options(options);
    if let Some(seed) = args.seed.or(config.shuffle_seed) {
        engine = engine.with_seed(seed);
    }
    let session = PlaylistSession::new(backend.auth.clone(), engine, backend.sink.clone());

    // ── Analyze, generate, share ──────────────────────────────────────────────
    session.analyze_taste(backend.history.as_deref()).await;

    let mood = args.mood.context("A mood is required")?;
    let playlist = session.generate(mood).await?;
    session.share(&StdoutShare);

    if args.save {
        if session.save().await {
            println!("\nSaved \"{}\" to {}", playlist.playlist_name(), backend.auth.connected_service);
        } else {
            eprintln!("\nCould not save the playlist. Check your connection and try again.");
        }
    }

    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("emolody=info"));
    match &config.log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
    Ok(())
}

async fn connect_backend(config: &Config) -> Backend {
    match config.service {
        ConnectedService::Spotify => match connect_spotify(config).await {
            Ok(backend) => backend,
            Err(e) => {
                warn!("Spotify unavailable, continuing offline: {e:#}");
                Backend::offline()
            }
        },
        ConnectedService::Local => match connect_local(config) {
            Ok(backend) => backend,
            Err(e) => {
                warn!("Local library unavailable, continuing offline: {e:#}");
                Backend::offline()
            }
        },
        ConnectedService::None => Backend::offline(),
    }
}

async fn connect_spotify(config: &Config) -> Result<Backend> {
    let creds = config
        .spotify
        .as_ref()
        .context("Spotify credentials are not configured")?;

    // ── Try Redis (optional, sign-in works without it) ──────────────────────
    let cache = match Cache::new(&config.redis_url) {
        Ok(cache) => {
            if cache.ping().await {
                info!("Redis connected at {}", config.redis_url);
                Some(cache)
            } else {
                warn!("Redis not reachable, token caching disabled");
                None
            }
        }
        Err(e) => {
            warn!("Redis unavailable ({e}), token caching disabled");
            None
        }
    };

    let spotify = spotify::connect(creds, cache.as_ref()).await?;
    let auth = spotify::session_for(&spotify).await?;
    Ok(Backend {
        catalog: Some(Arc::new(SpotifyCatalog::new(spotify.clone(), auth.is_authenticated))),
        history: Some(Arc::new(SpotifyLibrary::new(spotify.clone()))),
        sink: Some(Arc::new(SpotifyPlaylists::new(spotify))),
        auth,
    })
}

fn connect_local(config: &Config) -> Result<Backend> {
    let path = config
        .library_path
        .as_ref()
        .context("EMOLODY_LIBRARY_PATH is not set")?;
    let library = Arc::new(LocalLibrary::load(path)?);
    Ok(Backend {
        auth: AuthSession::signed_in(ConnectedService::Local, "Local User"),
        catalog: Some(library.clone()),
        history: Some(library),
        sink: Some(Arc::new(MemorySink::new())),
    })
}
