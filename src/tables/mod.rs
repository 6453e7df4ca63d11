use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, OnceLock},
};
use tracing::info;

use crate::app::state::{Mood, TasteProfile, Track};

const BUILTIN_TABLES: &str = include_str!("../../data/tables.json");

static BUILTIN: OnceLock<Arc<Tables>> = OnceLock::new();

/// Static lookup data behind the recommender: mood vocabulary, the
/// artist→genre map and the pre-authored song lists used when no live
/// catalog answers.
#[derive(Debug, Clone, Deserialize)]
pub struct Tables {
    mood_keywords: HashMap<Mood, Vec<String>>,
    artist_genres: HashMap<String, Vec<String>>,
    fallback_profile: TasteProfile,
    #[serde(default)]
    mood_tracks: HashMap<Mood, Vec<Track>>,
    #[serde(default)]
    preference_tracks: HashMap<String, Vec<Track>>,
    #[serde(default)]
    default_tracks: Vec<Track>,
    #[serde(skip, default = "generic_keywords")]
    generic_keywords: Vec<String>,
}

fn generic_keywords() -> Vec<String> {
    vec!["popular".to_string()]
}

impl Tables {
    /// The tables shipped inside the binary, parsed on first use.
    pub fn builtin() -> Result<Arc<Tables>> {
        if let Some(tables) = BUILTIN.get() {
            return Ok(tables.clone());
        }
        let parsed = Arc::new(Tables::parse(BUILTIN_TABLES).context("Built-in tables are malformed")?);
        Ok(BUILTIN.get_or_init(|| parsed).clone())
    }

    pub fn load(path: &Path) -> Result<Arc<Tables>> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tables from {}", path.display()))?;
        let tables = Tables::parse(&contents)
            .with_context(|| format!("Failed to parse tables in {}", path.display()))?;
        info!("Loaded recommendation tables from {}", path.display());
        Ok(Arc::new(tables))
    }

    pub fn parse(json: &str) -> Result<Tables> {
        Ok(serde_json::from_str(json)?)
    }

    /// Search vocabulary for a mood, in query order.
    pub fn keywords_for(&self, mood: Mood) -> &[String] {
        match self.mood_keywords.get(&mood) {
            Some(keywords) if !keywords.is_empty() => keywords,
            _ => &self.generic_keywords,
        }
    }

    pub fn genres_for_artist(&self, artist: &str) -> &[String] {
        self.artist_genres.get(artist).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fallback_profile(&self) -> &TasteProfile {
        &self.fallback_profile
    }

    pub fn tracks_for_mood(&self, mood: Mood) -> &[Track] {
        self.mood_tracks.get(&mood).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn tracks_for_preference(&self, preference: &str) -> &[Track] {
        self.preference_tracks.get(preference).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn default_tracks(&self) -> &[Track] {
        &self.default_tracks
    }
}
