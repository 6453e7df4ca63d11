use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Duration used when a catalog entry does not report one.
pub const DEFAULT_DURATION_SECS: u64 = 180;

/// A single recommendable song.
///
/// Two tracks are the same track when title and artist match; the duration is
/// display data and does not take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub duration: String,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, duration: impl Into<String>) -> Self {
        Track {
            title: title.into(),
            artist: artist.into(),
            duration: duration.into(),
        }
    }

    pub fn from_secs(title: impl Into<String>, artist: impl Into<String>, secs: Option<u64>) -> Self {
        Track::new(title, artist, format_duration(secs.unwrap_or(DEFAULT_DURATION_SECS)))
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.artist == other.artist
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.title.hash(state);
        self.artist.hash(state);
    }
}

/// Renders whole seconds as `m:ss`.
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumIter,
    strum_macros::EnumString,
    strum_macros::IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Mood {
    Happy,
    Sad,
    Energetic,
    Calm,
    Focused,
    Romantic,
}

impl Mood {
    pub fn raw_value(&self) -> &'static str {
        (*self).into()
    }
}

/// Ranked listening preferences for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasteProfile {
    pub top_genres: Vec<String>,
    pub favorite_artists: Vec<String>,
}

impl TasteProfile {
    pub fn new(top_genres: Vec<String>, favorite_artists: Vec<String>) -> Self {
        TasteProfile { top_genres, favorite_artists }
    }

    /// Genres first, then artists, each in rank order.
    pub fn combined_preferences(&self) -> Vec<String> {
        self.top_genres
            .iter()
            .chain(self.favorite_artists.iter())
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.top_genres.is_empty() && self.favorite_artists.is_empty()
    }
}

/// Output of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistResult {
    tracks: Vec<Track>,
    mood: Mood,
    generated_id: Option<String>,
}

impl PlaylistResult {
    /// An id is only stamped on playlists that actually hold tracks.
    pub fn new(mood: Mood, tracks: Vec<Track>, generated_at: i64) -> Self {
        let generated_id = if tracks.is_empty() {
            None
        } else {
            Some(format!("{}_{generated_at}", mood.raw_value().to_lowercase()))
        };
        PlaylistResult { tracks, mood, generated_id }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn generated_id(&self) -> Option<&str> {
        self.generated_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn playlist_name(&self) -> String {
        format!("Emolody {} Playlist", self.mood)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum ConnectedService {
    #[default]
    #[strum(to_string = "none")]
    None,
    #[strum(to_string = "local library")]
    Local,
    #[strum(to_string = "Spotify")]
    Spotify,
}

/// Who is signed in, and where. Filled in by whatever performed the sign-in.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    pub connected_service: ConnectedService,
    pub is_authenticated: bool,
    pub user_name: String,
    pub user_email: String,
}

impl AuthSession {
    pub fn signed_in(service: ConnectedService, user_name: impl Into<String>) -> Self {
        AuthSession {
            connected_service: service,
            is_authenticated: service != ConnectedService::None,
            user_name: user_name.into(),
            user_email: String::new(),
        }
    }

    pub fn anonymous() -> Self {
        AuthSession::default()
    }
}
