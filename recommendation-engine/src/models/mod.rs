use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One raw track record as supplied by the caller. Field defaults match
/// the upstream catalog contract: absent metadata degrades to placeholder
/// values rather than rejecting the record.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_artists")]
    pub artists: Vec<String>,
    #[serde(default = "default_album")]
    pub album: String,
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default)]
    pub explicit: bool,
    /// Cluster hint from the caller; overwritten once clustering runs.
    #[serde(default)]
    pub cluster: usize,
    /// Absent means the record carries no popularity signal at all,
    /// which is distinct from a popularity of zero.
    #[serde(default)]
    pub popularity_score: Option<f64>,
    #[serde(default, rename = "audioFeatures")]
    pub audio_features: HashMap<String, f64>,
}

fn default_artists() -> Vec<String> {
    vec!["Unknown".to_string()]
}

fn default_album() -> String {
    "Unknown".to_string()
}

fn default_year() -> i32 {
    2020
}

/// Full engine request: the catalog batch plus the per-request signal.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub tracks_data: Vec<TrackRecord>,
    #[serde(default)]
    pub user_data: UserData,
    #[serde(default = "default_context")]
    pub context: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_context() -> String {
    "general".to_string()
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default, rename = "listeningHistory")]
    pub listening_history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Preferences {
    #[serde(default, rename = "audioFeatures")]
    pub audio_features: Option<HashMap<String, f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "trackId")]
    pub track_id: TrackId,
}

/// Track identity on the wire: a row position, either as an integer or
/// its string form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TrackId {
    Index(i64),
    Text(String),
}

impl TrackId {
    /// Resolve to a valid row position, or None when out of range or
    /// not numeric.
    pub fn resolve(&self, track_count: usize) -> Option<usize> {
        let index = match self {
            TrackId::Index(idx) => usize::try_from(*idx).ok(),
            TrackId::Text(text) => text.trim().parse::<usize>().ok(),
        };
        index.filter(|idx| *idx < track_count)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub track_row: usize,
    pub source: RecallSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecallSource {
    Content,
    Collaborative,
    Context,
    Popularity,
}

impl RecallSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecallSource::Content => "content",
            RecallSource::Collaborative => "collaborative",
            RecallSource::Context => "context",
            RecallSource::Popularity => "popularity",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecallStats {
    pub content_count: usize,
    pub collaborative_count: usize,
    pub context_count: usize,
    pub popularity_count: usize,
    pub total_candidates: usize,
}

/// One formatted recommendation row.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendedTrack {
    pub id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album: String,
    pub year: i32,
    pub explicit: bool,
    pub audio_features: BTreeMap<String, f64>,
    pub cluster: usize,
    pub popularity_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationInsights {
    pub total_tracks_processed: usize,
    pub features_used: usize,
    pub clusters_created: usize,
    pub recommendation_engine: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
    pub tracks: Vec<RecommendedTrack>,
    pub insights: RecommendationInsights,
}
