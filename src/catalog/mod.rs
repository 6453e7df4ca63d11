use async_trait::async_trait;
use thiserror::Error;

use crate::app::state::Track;

pub mod local;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("not authenticated: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("query returned no usable tracks")]
    EmptyResult,
}

/// A searchable music database.
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Whether searches can be issued right now.
    fn is_authenticated(&self) -> bool;

    /// How many searches may be in flight at once. A catalog that serves
    /// requests one by one returns 1, so per-query timeouts only start once
    /// the catalog picks the query up.
    fn max_concurrent_searches(&self) -> usize {
        usize::MAX
    }

    /// Free-text track search returning at most `limit` tracks, best match first.
    async fn search(&self, term: &str, limit: u32) -> Result<Vec<Track>, CatalogError>;
}

/// Where listening history comes from.
#[async_trait]
pub trait LibraryHistorySource: Send + Sync {
    /// Recent library items as `(artist, plays)` pairs.
    async fn fetch_recent_items(&self, limit: usize) -> Result<Vec<(String, u32)>, CatalogError>;
}

/// Destination for generated playlists on the connected service.
#[async_trait]
pub trait PlaylistSink: Send + Sync {
    async fn create_playlist(&self, tracks: &[Track], name: &str) -> bool;

    /// Best effort; failures are only logged.
    async fn open_playlist(&self, name: &str);
}

/// System-level share sheet.
pub trait ShareSurface {
    fn present(&self, text: &str);
}
