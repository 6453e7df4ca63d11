use std::collections::HashSet;

use crate::{app::state::Mood, tables::Tables};

/// Only the strongest preferences turn into queries.
pub const MAX_PREFERENCES: usize = 3;

/// Crosses the leading preferences with the mood vocabulary.
///
/// Queries come out preference-major, keyword-minor. Without any usable
/// preference the mood name stands in, so a valid mood always yields queries.
pub fn plan(tables: &Tables, mood: Mood, preferences: &[String]) -> Vec<String> {
    let mut seeds: Vec<&str> = preferences
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .take(MAX_PREFERENCES)
        .collect();
    if seeds.is_empty() {
        seeds.push(mood.raw_value());
    }

    let keywords = tables.keywords_for(mood);
    let mut seen = HashSet::new();
    seeds
        .iter()
        .flat_map(|seed| keywords.iter().map(move |keyword| format!("{seed} {keyword}")))
        .filter(|query| seen.insert(query.clone()))
        .collect()
}
