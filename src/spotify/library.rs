use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use rspotify::{model::SavedTrack, prelude::*};

use super::SharedSpotify;
use crate::catalog::{CatalogError, LibraryHistorySource};

/// Liked songs as listening history: each saved track counts once for its
/// lead artist.
pub struct SpotifyLibrary {
    spotify: SharedSpotify,
}

impl SpotifyLibrary {
    pub fn new(spotify: SharedSpotify) -> Self {
        SpotifyLibrary { spotify }
    }
}

#[async_trait]
impl LibraryHistorySource for SpotifyLibrary {
    async fn fetch_recent_items(&self, limit: usize) -> Result<Vec<(String, u32)>, CatalogError> {
        let sp = self.spotify.lock().await;
        let saved: Vec<SavedTrack> = sp
            .current_user_saved_tracks(None)
            .take(limit)
            .try_collect()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(saved
            .into_iter()
            .filter_map(|s| s.track.artists.into_iter().next())
            .map(|artist| (artist.name, 1))
            .collect())
    }
}
