/// Feature Store
///
/// Owns the row-ordered catalog: track metadata, the canonical
/// feature-name ordering (recognized raw features followed by derived
/// features), and the raw feature matrix every downstream component reads.
/// Row position is the track identity for the lifetime of the engine.
use crate::error::{EngineError, Result};
use crate::models::TrackRecord;
use ndarray::{s, Array1, Array2};
use tracing::info;

/// Audio features the engine recognizes, in canonical order.
pub const EXPECTED_FEATURES: [&str; 13] = [
    "danceability",
    "energy",
    "key",
    "loudness",
    "mode",
    "speechiness",
    "acousticness",
    "instrumentalness",
    "liveness",
    "valence",
    "tempo",
    "duration_ms",
    "time_signature",
];

/// Metadata carried alongside each feature row.
#[derive(Debug, Clone)]
pub struct TrackMeta {
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub year: i32,
    pub explicit: bool,
    pub popularity_score: f64,
    pub cluster: usize,
}

#[derive(Debug, Clone)]
pub struct FeatureTable {
    metas: Vec<TrackMeta>,
    feature_names: Vec<String>,
    matrix: Array2<f64>,
    /// Present iff at least one input record supplied a popularity score.
    popularity: Option<Vec<f64>>,
}

impl FeatureTable {
    /// Build the table from raw records.
    ///
    /// Recognized features are the expected names present in at least one
    /// record; per-row missing values default to 0.0. Derived features are
    /// appended once, after the raw columns, and only when every raw input
    /// they need is recognized.
    pub fn from_records(records: Vec<TrackRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(EngineError::Data("no tracks provided".to_string()));
        }

        let recognized: Vec<String> = EXPECTED_FEATURES
            .iter()
            .filter(|name| {
                records
                    .iter()
                    .any(|record| record.audio_features.contains_key(**name))
            })
            .map(|name| name.to_string())
            .collect();

        if recognized.is_empty() {
            return Err(EngineError::Data(
                "no recognized audio features in the input catalog".to_string(),
            ));
        }

        let rows = records.len();
        let mut data = Vec::with_capacity(rows * recognized.len());
        for record in &records {
            for name in &recognized {
                data.push(
                    record
                        .audio_features
                        .get(name.as_str())
                        .copied()
                        .unwrap_or(0.0),
                );
            }
        }
        let raw_matrix = Array2::from_shape_vec((rows, recognized.len()), data)
            .map_err(|e| EngineError::Data(format!("failed to build feature matrix: {}", e)))?;

        let has_popularity = records.iter().any(|r| r.popularity_score.is_some());
        let popularity = has_popularity.then(|| {
            records
                .iter()
                .map(|r| r.popularity_score.unwrap_or(0.0))
                .collect()
        });

        let metas = records
            .into_iter()
            .map(|record| TrackMeta {
                name: record.name,
                artists: record.artists,
                album: record.album,
                year: record.year,
                explicit: record.explicit,
                popularity_score: record.popularity_score.unwrap_or(0.0),
                cluster: record.cluster,
            })
            .collect();

        let mut table = FeatureTable {
            metas,
            feature_names: recognized,
            matrix: raw_matrix,
            popularity,
        };
        table.append_derived_features()?;

        info!(
            tracks = table.n_tracks(),
            features = table.n_features(),
            "catalog loaded"
        );

        Ok(table)
    }

    /// `mood_energy = energy * valence`
    /// `dance_tempo = danceability * (tempo / 200)`
    /// `acoustic_instrumental = (acousticness + instrumentalness) / 2`
    fn append_derived_features(&mut self) -> Result<()> {
        let mut derived: Vec<(String, Array1<f64>)> = Vec::new();

        if let (Some(energy), Some(valence)) =
            (self.feature_index("energy"), self.feature_index("valence"))
        {
            let column = &self.matrix.column(energy) * &self.matrix.column(valence);
            derived.push(("mood_energy".to_string(), column));
        }

        if let (Some(danceability), Some(tempo)) = (
            self.feature_index("danceability"),
            self.feature_index("tempo"),
        ) {
            let scaled_tempo = self.matrix.column(tempo).mapv(|t| t / 200.0);
            let column = &self.matrix.column(danceability) * &scaled_tempo;
            derived.push(("dance_tempo".to_string(), column));
        }

        if let (Some(acousticness), Some(instrumentalness)) = (
            self.feature_index("acousticness"),
            self.feature_index("instrumentalness"),
        ) {
            let column =
                (&self.matrix.column(acousticness) + &self.matrix.column(instrumentalness)) * 0.5;
            derived.push(("acoustic_instrumental".to_string(), column));
        }

        if derived.is_empty() {
            return Ok(());
        }

        let rows = self.matrix.nrows();
        let base = self.matrix.ncols();
        let mut full = Array2::zeros((rows, base + derived.len()));
        full.slice_mut(s![.., ..base]).assign(&self.matrix);
        for (offset, (name, column)) in derived.into_iter().enumerate() {
            full.column_mut(base + offset).assign(&column);
            self.feature_names.push(name);
        }
        self.matrix = full;

        Ok(())
    }

    pub fn n_tracks(&self) -> usize {
        self.metas.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Canonical feature-name ordering: recognized raw, then derived.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    /// Raw feature matrix (rows x features), including derived columns.
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn popularity(&self) -> Option<&[f64]> {
        self.popularity.as_deref()
    }

    pub fn meta(&self, row: usize) -> &TrackMeta {
        &self.metas[row]
    }

    pub fn cluster_of(&self, row: usize) -> usize {
        self.metas[row].cluster
    }

    /// Overwrite cluster ids once clustering has run. The table is treated
    /// as immutable after this point.
    pub fn set_clusters(&mut self, assignments: &[usize]) {
        for (meta, &cluster) in self.metas.iter_mut().zip(assignments) {
            meta.cluster = cluster;
        }
    }

    /// Full feature map for one row, keyed by canonical name.
    pub fn features_of(&self, row: usize) -> std::collections::BTreeMap<String, f64> {
        self.feature_names
            .iter()
            .enumerate()
            .map(|(col, name)| (name.clone(), self.matrix[[row, col]]))
            .collect()
    }
}
