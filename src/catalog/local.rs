//! On-device library backend.
//!
//! The library is a JSON document listing the tracks available locally plus a
//! play history. It answers catalog searches, feeds taste analysis and keeps
//! created playlists in memory.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::{collections::HashSet, path::Path};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{CatalogError, LibraryHistorySource, PlaylistSink, TrackCatalog};
use crate::app::state::Track;

#[derive(Debug, Clone, Deserialize)]
pub struct LocalTrack {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub duration_secs: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl LocalTrack {
    fn search_tokens(&self) -> HashSet<String> {
        let words = self
            .title
            .split_whitespace()
            .chain(self.artist.split_whitespace())
            .map(str::to_lowercase);
        let tags = self.tags.iter().flat_map(|t| {
            let whole = t.to_lowercase();
            let parts: Vec<String> = whole.split_whitespace().map(str::to_string).collect();
            std::iter::once(whole).chain(parts)
        });
        words.chain(tags).collect()
    }

    fn to_track(&self) -> Track {
        Track::from_secs(&self.title, &self.artist, self.duration_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayCount {
    pub artist: String,
    #[serde(default = "one")]
    pub plays: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    tracks: Vec<LocalTrack>,
    #[serde(default)]
    history: Vec<PlayCount>,
}

pub struct LocalLibrary {
    tracks: Vec<LocalTrack>,
    history: Vec<PlayCount>,
    authorized: bool,
}

impl LocalLibrary {
    pub fn new(tracks: Vec<LocalTrack>, history: Vec<PlayCount>) -> Self {
        LocalLibrary { tracks, history, authorized: true }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read local library {}", path.display()))?;
        let file: LibraryFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse local library {}", path.display()))?;
        info!(
            "Local library loaded: {} tracks, {} history entries",
            file.tracks.len(),
            file.history.len()
        );
        Ok(LocalLibrary::new(file.tracks, file.history))
    }

    /// Simulates the user revoking library access.
    pub fn with_access(mut self, authorized: bool) -> Self {
        self.authorized = authorized;
        self
    }
}

#[async_trait]
impl TrackCatalog for LocalLibrary {
    fn is_authenticated(&self) -> bool {
        self.authorized
    }

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<Track>, CatalogError> {
        if !self.authorized {
            return Err(CatalogError::Auth("library access not granted".into()));
        }
        let wanted: Vec<String> = term.split_whitespace().map(str::to_lowercase).collect();

        let mut scored: Vec<(usize, &LocalTrack)> = self
            .tracks
            .iter()
            .filter_map(|track| {
                let tokens = track.search_tokens();
                let score = wanted.iter().filter(|w| tokens.contains(*w)).count();
                (score > 0).then_some((score, track))
            })
            .collect();
        // Stable, so equal scores keep library order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let hits: Vec<Track> = scored
            .into_iter()
            .take(limit as usize)
            .map(|(_, t)| t.to_track())
            .collect();
        debug!("Local search '{term}' matched {} tracks", hits.len());

        if hits.is_empty() {
            Err(CatalogError::EmptyResult)
        } else {
            Ok(hits)
        }
    }
}

#[async_trait]
impl LibraryHistorySource for LocalLibrary {
    async fn fetch_recent_items(&self, limit: usize) -> Result<Vec<(String, u32)>, CatalogError> {
        if !self.authorized {
            return Err(CatalogError::Auth("library access not granted".into()));
        }
        Ok(self
            .history
            .iter()
            .take(limit)
            .map(|p| (p.artist.clone(), p.plays))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPlaylist {
    pub name: String,
    pub tracks: Vec<Track>,
}

/// Keeps the most recently created playlist in memory.
#[derive(Default)]
pub struct MemorySink {
    last: Mutex<Option<CreatedPlaylist>>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub async fn last_created(&self) -> Option<CreatedPlaylist> {
        self.last.lock().await.clone()
    }
}

#[async_trait]
impl PlaylistSink for MemorySink {
    async fn create_playlist(&self, tracks: &[Track], name: &str) -> bool {
        *self.last.lock().await = Some(CreatedPlaylist {
            name: name.to_string(),
            tracks: tracks.to_vec(),
        });
        info!("Local playlist created: {name} with {} songs", tracks.len());
        true
    }

    async fn open_playlist(&self, name: &str) {
        debug!("Local playlist '{name}' has no external app to open");
    }
}
