use tracing::{info, warn};

use crate::{
    app::state::TasteProfile,
    catalog::LibraryHistorySource,
    tables::Tables,
};

pub const MAX_ARTISTS: usize = 5;
pub const MAX_GENRES: usize = 3;
/// How much recent history one analysis looks at.
pub const HISTORY_WINDOW: usize = 100;

/// Builds a ranked profile from `(artist, plays)` history.
///
/// Empty history yields the fallback profile from `tables`.
pub fn extract(tables: &Tables, history: &[(String, u32)]) -> TasteProfile {
    if history.is_empty() {
        return tables.fallback_profile().clone();
    }

    let artist_counts = tally(history.iter().map(|(artist, plays)| (artist.as_str(), *plays)));
    let favorite_artists: Vec<String> = artist_counts
        .into_iter()
        .take(MAX_ARTISTS)
        .map(|(artist, _)| artist.to_string())
        .collect();

    let genre_counts = tally(
        favorite_artists
            .iter()
            .flat_map(|artist| tables.genres_for_artist(artist))
            .map(|genre| (genre.as_str(), 1)),
    );
    let top_genres: Vec<String> = genre_counts
        .into_iter()
        .take(MAX_GENRES)
        .map(|(genre, _)| genre.to_string())
        .collect();

    TasteProfile::new(top_genres, favorite_artists)
}

/// Sums weights per key and orders by total descending, ties in first-seen order.
fn tally<'a>(items: impl Iterator<Item = (&'a str, u32)>) -> Vec<(&'a str, u32)> {
    let mut counts: Vec<(&str, u32)> = Vec::new();
    for (key, weight) in items {
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, total)) => *total = total.saturating_add(weight),
            None => counts.push((key, weight)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Reads recent history from `source` and extracts a profile.
///
/// No source means no signal and an empty profile. A failing source is
/// absorbed: the fallback profile stands in for the real one.
pub async fn analyze(tables: &Tables, source: Option<&dyn LibraryHistorySource>) -> TasteProfile {
    let Some(source) = source else {
        return TasteProfile::default();
    };

    match source.fetch_recent_items(HISTORY_WINDOW).await {
        Ok(history) => {
            let profile = extract(tables, &history);
            info!(
                "Analyzed music taste: genres={:?} artists={:?}",
                profile.top_genres, profile.favorite_artists
            );
            profile
        }
        Err(e) => {
            warn!("Library analysis failed, using fallback profile: {e}");
            tables.fallback_profile().clone()
        }
    }
}
