use async_trait::async_trait;
use rspotify::{
    model::{FullTrack, SearchResult, SearchType},
    prelude::*,
};

use super::SharedSpotify;
use crate::{
    app::state::Track,
    catalog::{CatalogError, TrackCatalog},
};

/// Spotify track search behind the catalog seam.
pub struct SpotifyCatalog {
    spotify: SharedSpotify,
    authenticated: bool,
}

impl SpotifyCatalog {
    pub fn new(spotify: SharedSpotify, authenticated: bool) -> Self {
        SpotifyCatalog { spotify, authenticated }
    }
}

pub(crate) fn to_track(track: &FullTrack) -> Track {
    let artist = track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let secs = u64::try_from(track.duration.num_seconds()).ok();
    Track::from_secs(&track.name, artist, secs)
}

#[async_trait]
impl TrackCatalog for SpotifyCatalog {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<Track>, CatalogError> {
        if term.trim().is_empty() {
            return Err(CatalogError::EmptyResult);
        }
        // Clones share the token, so the lock is released before the request goes out.
        let sp = self.spotify.lock().await.clone();
        let result = sp
            .search(term, SearchType::Track, None, None, Some(limit), None)
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let tracks: Vec<Track> = match result {
            SearchResult::Tracks(page) => page.items.iter().map(to_track).collect(),
            _ => vec![],
        };
        if tracks.is_empty() {
            Err(CatalogError::EmptyResult)
        } else {
            Ok(tracks)
        }
    }
}
