pub mod state;

use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    app::state::{AuthSession, Mood, PlaylistResult, TasteProfile},
    catalog::{LibraryHistorySource, PlaylistSink, ShareSurface},
    engine::RecommendationEngine,
    taste,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a playlist is already being generated for this session")]
    GenerationInFlight,
}

/// Per-user recommendation state: the current taste profile, the last
/// generated playlist, and the services that act on them.
pub struct PlaylistSession {
    auth: AuthSession,
    engine: RecommendationEngine,
    sink: Option<Arc<dyn PlaylistSink>>,
    profile: RwLock<TasteProfile>,
    current: RwLock<Option<PlaylistResult>>,
    generating: Mutex<()>,
}

impl PlaylistSession {
    pub fn new(auth: AuthSession, engine: RecommendationEngine, sink: Option<Arc<dyn PlaylistSink>>) -> Self {
        PlaylistSession {
            auth,
            engine,
            sink,
            profile: RwLock::new(TasteProfile::default()),
            current: RwLock::new(None),
            generating: Mutex::new(()),
        }
    }

    pub fn profile(&self) -> TasteProfile {
        self.profile.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn current(&self) -> Option<PlaylistResult> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Re-derives the taste profile, replacing whatever was there before.
    pub async fn analyze_taste(&self, source: Option<&dyn LibraryHistorySource>) -> TasteProfile {
        let profile = taste::analyze(self.engine.tables(), source).await;
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = profile.clone();
        profile
    }

    /// Generates a playlist for `mood` and makes it the current one.
    ///
    /// Only one generation may run per session; an overlapping call is
    /// rejected rather than queued.
    pub async fn generate(&self, mood: Mood) -> Result<PlaylistResult, SessionError> {
        let _guard = self.generating.try_lock().map_err(|_| SessionError::GenerationInFlight)?;

        let profile = self.profile();
        let result = self.engine.generate(mood, &profile).await;
        info!(
            "Generated {} songs for {mood} mood (preferences: {:?})",
            result.tracks().len(),
            profile.combined_preferences()
        );
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(result.clone());
        Ok(result)
    }

    /// Hands the current playlist to the connected service.
    ///
    /// Returns false when there is nothing to save, no service to save to, or
    /// the service refused it.
    pub async fn save(&self) -> bool {
        let Some(playlist) = self.current().filter(|p| !p.is_empty()) else {
            return false;
        };
        let Some(sink) = &self.sink else {
            warn!("No connected service to save the playlist to");
            return false;
        };

        let name = playlist.playlist_name();
        let saved = sink.create_playlist(playlist.tracks(), &name).await;
        if saved {
            info!("Playlist saved to {}: {name}", self.auth.connected_service);
            sink.open_playlist(&name).await;
        } else {
            warn!("{} rejected playlist {name}", self.auth.connected_service);
        }
        saved
    }

    /// Formats the current playlist and hands it to `surface`.
    pub fn share(&self, surface: &dyn ShareSurface) -> Option<String> {
        let playlist = self.current().filter(|p| !p.is_empty())?;
        let text = share_text(&playlist);
        surface.present(&text);
        Some(text)
    }
}

pub fn share_text(playlist: &PlaylistResult) -> String {
    let listing = playlist
        .tracks()
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {} - {} ({})", i + 1, t.title, t.artist, t.duration))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "🎵 My Emolody Playlist - {} 🎵\n\n{listing}\n\nGenerated with Emolody App",
        playlist.mood()
    )
}
