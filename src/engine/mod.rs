//! Playlist generation.
//!
//! A generation plans catalog queries from the mood and the taste profile,
//! runs them against the live catalog, and deduplicates what comes back. If
//! the live path is unavailable or comes back too thin, the result is
//! assembled from the static song tables instead. Every path ends in a
//! `PlaylistResult`; catalog failures never reach the caller.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::time;
use tracing::{debug, info, warn};

use crate::{
    app::state::{Mood, PlaylistResult, TasteProfile, Track},
    catalog::{CatalogError, TrackCatalog},
    planner,
    tables::Tables,
};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Tracks requested per planned query.
    pub per_query_limit: u32,
    /// Cap on a catalog-backed playlist.
    pub live_cap: usize,
    /// Cap on a playlist built from the static tables.
    pub fallback_cap: usize,
    pub query_timeout: Duration,
    /// Fewer distinct live tracks than this and the static path takes over.
    pub min_live_tracks: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            per_query_limit: 5,
            live_cap: 15,
            fallback_cap: 12,
            query_timeout: Duration::from_secs(4),
            min_live_tracks: 1,
        }
    }
}

pub struct RecommendationEngine {
    tables: Arc<Tables>,
    catalog: Option<Arc<dyn TrackCatalog>>,
    options: EngineOptions,
    rng: Mutex<StdRng>,
}

impl RecommendationEngine {
    pub fn new(tables: Arc<Tables>, catalog: Option<Arc<dyn TrackCatalog>>) -> Self {
        RecommendationEngine {
            tables,
            catalog,
            options: EngineOptions::default(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Makes the static-path shuffle reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn tables(&self) -> &Arc<Tables> {
        &self.tables
    }

    pub async fn generate(&self, mood: Mood, profile: &TasteProfile) -> PlaylistResult {
        let preferences = profile.combined_preferences();
        let queries = planner::plan(&self.tables, mood, &preferences);
        debug!("Planned {} queries for {mood}", queries.len());

        let tracks = match self.live_tracks(&queries).await {
            Ok(tracks) => {
                info!("Generated {} catalog tracks for {mood}", tracks.len());
                tracks
            }
            Err(e) => {
                info!("Using static tables for {mood}: {e}");
                self.static_tracks(mood, &preferences)
            }
        };

        PlaylistResult::new(mood, tracks, Utc::now().timestamp())
    }

    async fn live_tracks(&self, queries: &[String]) -> Result<Vec<Track>, CatalogError> {
        let catalog = match &self.catalog {
            Some(catalog) if catalog.is_authenticated() => &**catalog,
            Some(_) => return Err(CatalogError::Auth("catalog session is not authenticated".into())),
            None => return Err(CatalogError::Auth("no catalog connected".into())),
        };

        // `buffered` yields in input order, so plan order survives concurrent completion.
        // Search futures are created only when a slot frees up, so a queued
        // query's timeout has not started yet.
        let width = catalog.max_concurrent_searches().max(1);
        let batches: Vec<Vec<Track>> = stream::iter(queries)
            .map(|q| self.search_one(catalog, q))
            .buffered(width)
            .collect()
            .await;
        let tracks = dedup(batches.into_iter().flatten(), self.options.live_cap);

        if tracks.len() < self.options.min_live_tracks {
            return Err(CatalogError::EmptyResult);
        }
        Ok(tracks)
    }

    async fn search_one(&self, catalog: &dyn TrackCatalog, query: &str) -> Vec<Track> {
        let limit = self.options.per_query_limit;
        match time::timeout(self.options.query_timeout, catalog.search(query, limit)).await {
            Ok(Ok(mut tracks)) => {
                tracks.truncate(limit as usize);
                tracks
            }
            Ok(Err(e)) => {
                warn!("Search error for term '{query}': {e}");
                Vec::new()
            }
            Err(_) => {
                let e = CatalogError::Network(format!("timed out after {:?}", self.options.query_timeout));
                warn!("Search error for term '{query}': {e}");
                Vec::new()
            }
        }
    }

    fn static_tracks(&self, mood: Mood, preferences: &[String]) -> Vec<Track> {
        let mut pool: Vec<Track> = self.tables.tracks_for_mood(mood).to_vec();
        for preference in preferences {
            pool.extend_from_slice(self.tables.tracks_for_preference(preference));
        }
        if pool.is_empty() {
            pool = self.tables.default_tracks().to_vec();
        }

        let mut pool = dedup(pool, usize::MAX);
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        pool.shuffle(&mut *rng);
        pool.truncate(self.options.fallback_cap);
        pool
    }
}

/// Keeps the first occurrence of each `(title, artist)`, up to `cap` tracks.
pub fn dedup(tracks: impl IntoIterator<Item = Track>, cap: usize) -> Vec<Track> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .take(cap)
        .collect()
}
