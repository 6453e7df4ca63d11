use anyhow::{anyhow, Context, Result};
use rspotify::{
    clients::{BaseClient, OAuthClient},
    scopes, AuthCodePkceSpotify, Config as SpotifyConfig, Credentials, OAuth, Token,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::app::state::{AuthSession, ConnectedService};
use crate::cache::Cache;
use crate::config::SpotifyCredentials;

pub mod auth;
pub mod library;
pub mod playlists;
pub mod search;

pub type SharedSpotify = Arc<Mutex<AuthCodePkceSpotify>>;

const TOKEN_CACHE_KEY: &str = "emolody:spotify_token";
const TOKEN_TTL_SECS: u64 = 3600 * 24;

fn build_client(creds: &SpotifyCredentials) -> AuthCodePkceSpotify {
    let scopes = scopes!(
        "user-read-private",
        "user-read-email",
        "user-top-read",
        "user-library-read",
        "playlist-modify-public",
        "playlist-modify-private"
    );

    let oauth = OAuth {
        redirect_uri: creds.redirect_uri.clone(),
        scopes,
        ..Default::default()
    };

    let sp_config = SpotifyConfig {
        token_refreshing: true,
        ..Default::default()
    };

    AuthCodePkceSpotify::with_config(
        Credentials::new(&creds.client_id, &creds.client_secret),
        oauth,
        sp_config,
    )
}

/// Signs in to Spotify and returns the ready client.
///
/// A token cached in Redis is reused when it can still be refreshed;
/// otherwise the browser is sent through the PKCE authorization flow and the
/// redirect is caught on the local callback listener.
pub async fn connect(creds: &SpotifyCredentials, cache: Option<&Cache>) -> Result<SharedSpotify> {
    let mut spotify = build_client(creds);

    if let Some(cache) = cache {
        if let Some(token) = cache.get_json::<Token>(TOKEN_CACHE_KEY).await {
            info!("Loaded cached Spotify token");
            set_token(&spotify, Some(token)).await?;
            match spotify.refresh_token().await {
                Ok(()) => {
                    store_token(&spotify, cache).await;
                    return Ok(Arc::new(Mutex::new(spotify)));
                }
                Err(e) => {
                    warn!("Cached token could not be refreshed ({e}), signing in again");
                    set_token(&spotify, None).await?;
                    cache.delete(TOKEN_CACHE_KEY).await;
                }
            }
        }
    }

    let url = spotify
        .get_authorize_url(None)
        .context("Failed to build the Spotify authorization URL")?;
    info!("Opening browser for Spotify sign-in");
    if let Err(e) = open::that(&url) {
        warn!("Could not open browser ({e}); visit {url}");
    }

    let redirect = auth::wait_for_auth_code(&creds.redirect_uri).await?;
    spotify
        .request_token(&redirect.code)
        .await
        .context("Spotify rejected the authorization code")?;

    if let Some(cache) = cache {
        store_token(&spotify, cache).await;
    }
    Ok(Arc::new(Mutex::new(spotify)))
}

/// Reads the signed-in account into an `AuthSession`.
pub async fn session_for(spotify: &SharedSpotify) -> Result<AuthSession> {
    let sp = spotify.lock().await;
    let me = sp.me().await.context("Failed to read the Spotify profile")?;
    let mut session = AuthSession::signed_in(
        ConnectedService::Spotify,
        me.display_name.unwrap_or_else(|| "Spotify User".to_string()),
    );
    session.user_email = me.email.unwrap_or_default();
    Ok(session)
}

async fn set_token(spotify: &AuthCodePkceSpotify, token: Option<Token>) -> Result<()> {
    let mut guard = spotify
        .token
        .lock()
        .await
        .map_err(|_| anyhow!("Spotify token lock is poisoned"))?;
    *guard = token;
    Ok(())
}

async fn store_token(spotify: &AuthCodePkceSpotify, cache: &Cache) {
    let token = match spotify.token.lock().await {
        Ok(guard) => (*guard).clone(),
        Err(_) => return,
    };
    if let Some(token) = token {
        match cache.set_json(TOKEN_CACHE_KEY, &token, TOKEN_TTL_SECS).await {
            Ok(()) => info!("Spotify token cached"),
            Err(e) => warn!("Could not cache Spotify token: {e}"),
        }
    }
}
