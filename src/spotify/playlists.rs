use anyhow::Result;
use async_trait::async_trait;
use rspotify::{
    model::{PlayableId, SearchResult, SearchType, TrackId},
    prelude::*,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::SharedSpotify;
use crate::{app::state::Track, catalog::PlaylistSink};

const PLAYLIST_DESCRIPTION: &str = "Generated by Emolody to match your mood";

/// Creates playlists on the signed-in Spotify account.
pub struct SpotifyPlaylists {
    spotify: SharedSpotify,
    last_url: Mutex<Option<String>>,
}

impl SpotifyPlaylists {
    pub fn new(spotify: SharedSpotify) -> Self {
        SpotifyPlaylists {
            spotify,
            last_url: Mutex::new(None),
        }
    }

    /// Spotify ids for `tracks`; anything that cannot be found is skipped.
    async fn resolve(&self, tracks: &[Track]) -> Vec<TrackId<'static>> {
        let sp = self.spotify.lock().await;
        let mut ids = Vec::with_capacity(tracks.len());
        for track in tracks {
            let query = format!("track:{} artist:{}", track.title, track.artist);
            match sp.search(&query, SearchType::Track, None, None, Some(1), None).await {
                Ok(SearchResult::Tracks(page)) => {
                    match page.items.into_iter().next().and_then(|t| t.id) {
                        Some(id) => ids.push(id),
                        None => debug!("No Spotify match for {} - {}", track.title, track.artist),
                    }
                }
                Ok(_) => {}
                Err(e) => debug!("Lookup failed for {} - {}: {e}", track.title, track.artist),
            }
        }
        ids
    }

    async fn create(&self, tracks: &[Track], name: &str) -> Result<usize> {
        let ids = self.resolve(tracks).await;
        if ids.is_empty() {
            return Ok(0);
        }

        let sp = self.spotify.lock().await;
        let me = sp.me().await?;
        let playlist = sp
            .user_playlist_create(me.id, name, Some(false), Some(false), Some(PLAYLIST_DESCRIPTION))
            .await?;
        *self.last_url.lock().await = playlist.external_urls.get("spotify").cloned();

        let added = ids.len();
        sp.playlist_add_items(playlist.id, ids.into_iter().map(PlayableId::Track), None)
            .await?;
        Ok(added)
    }
}

#[async_trait]
impl PlaylistSink for SpotifyPlaylists {
    async fn create_playlist(&self, tracks: &[Track], name: &str) -> bool {
        match self.create(tracks, name).await {
            Ok(0) => {
                warn!("Skipped Spotify playlist {name}: none of its songs were found");
                false
            }
            Ok(added) => {
                info!("Spotify playlist created: {name} with {added} of {} songs", tracks.len());
                true
            }
            Err(e) => {
                warn!("Failed to create Spotify playlist {name}: {e}");
                false
            }
        }
    }

    async fn open_playlist(&self, name: &str) {
        let target = self
            .last_url
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| "spotify:".to_string());
        if let Err(e) = open::that(&target) {
            warn!("Could not open {name} in Spotify: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rspotify::AuthCodePkceSpotify;
    use std::sync::Arc;

    fn offline_playlists() -> SpotifyPlaylists {
        SpotifyPlaylists::new(Arc::new(Mutex::new(AuthCodePkceSpotify::default())))
    }

    #[tokio::test]
    async fn test_nothing_resolved_creates_no_playlist() {
        let playlists = offline_playlists();

        // An account call here would fail without a token, so Ok(0) means none was made.
        assert_eq!(playlists.create(&[], "Emolody Sad Playlist").await.ok(), Some(0));
        assert!(playlists.last_url.lock().await.is_none());
        assert!(!playlists.create_playlist(&[], "Emolody Sad Playlist").await);
    }
}
