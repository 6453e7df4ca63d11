use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::{path::PathBuf, time::Duration};

use crate::app::state::ConnectedService;

const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 4;

#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ConnectedService,
    pub spotify: Option<SpotifyCredentials>,
    pub redis_url: String,
    pub library_path: Option<PathBuf>,
    pub tables_path: Option<PathBuf>,
    pub query_timeout: Duration,
    pub shuffle_seed: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv().ok(); // .env is optional, plain environment variables work too
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let spotify = match (var("SPOTIFY_CLIENT_ID"), var("SPOTIFY_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
                redirect_uri: var("SPOTIFY_REDIRECT_URI")
                    .unwrap_or_else(|| "http://127.0.0.1:8989/login".to_string()),
            }),
            _ => None,
        };
        let library_path = var("EMOLODY_LIBRARY_PATH").map(PathBuf::from);

        let service = match var("EMOLODY_SERVICE").map(|s| s.to_lowercase()).as_deref() {
            Some("spotify") => ConnectedService::Spotify,
            Some("local") => ConnectedService::Local,
            Some("none") => ConnectedService::None,
            Some(other) => bail!("EMOLODY_SERVICE must be one of spotify, local, none (got '{other}')"),
            None if spotify.is_some() => ConnectedService::Spotify,
            None if library_path.is_some() => ConnectedService::Local,
            None => ConnectedService::None,
        };

        if service == ConnectedService::Spotify && spotify.is_none() {
            bail!("SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET are required for the Spotify service");
        }
        if service == ConnectedService::Local && library_path.is_none() {
            bail!("EMOLODY_LIBRARY_PATH is required for the local service");
        }

        let query_timeout_secs = match var("EMOLODY_QUERY_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("EMOLODY_QUERY_TIMEOUT_SECS is not a number: {raw}"))?,
            None => DEFAULT_QUERY_TIMEOUT_SECS,
        };
        let shuffle_seed = var("EMOLODY_SHUFFLE_SEED")
            .map(|raw| {
                raw.parse::<u64>()
                    .with_context(|| format!("EMOLODY_SHUFFLE_SEED is not a number: {raw}"))
            })
            .transpose()?;

        Ok(Config {
            service,
            spotify,
            redis_url: var("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            library_path,
            tables_path: var("EMOLODY_TABLES_PATH").map(PathBuf::from),
            query_timeout: Duration::from_secs(query_timeout_secs),
            shuffle_seed,
            log_file: var("EMOLODY_LOG_FILE").map(PathBuf::from),
        })
    }
}
