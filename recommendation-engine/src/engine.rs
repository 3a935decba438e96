/// Engine assembly and the per-request entry point.
///
/// `EngineBuilder` runs the one-time setup sequence (feature table,
/// fitted transforms, clustering, similarity index) and yields an
/// immutable `RecommendationEngine`; a request can therefore never
/// observe half-fitted state. Rebuilding on a catalog change means
/// building a new engine.
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{
    RecommendResponse, RecommendationInsights, RecommendedTrack, TrackRecord, UserData,
};
use crate::services::{
    ClusterModel, FeatureTable, FittedPipeline, FusionRanker, RecallContext, RecallLayer,
    SimilarityIndex,
};
use tracing::{debug, info};

pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// One-time blocking setup. Any failure aborts the whole pipeline
    /// and surfaces as a single structured error.
    pub fn build(self, records: Vec<TrackRecord>) -> Result<RecommendationEngine> {
        let mut table = FeatureTable::from_records(records)?;
        let pipeline = FittedPipeline::fit(&table)?;

        let clusters = ClusterModel::fit(pipeline.working())?;
        table.set_clusters(clusters.assignments());

        let mut rng = self.config.rng();
        let similarity =
            SimilarityIndex::build(pipeline.working(), self.config.similarity.sample_size, &mut rng)?;

        info!(
            tracks = table.n_tracks(),
            features = table.n_features(),
            working_dim = pipeline.working_dim(),
            clusters = clusters.n_clusters(),
            index_size = similarity.len(),
            "engine ready"
        );

        Ok(RecommendationEngine {
            table,
            pipeline,
            similarity,
            recall: RecallLayer::new(),
            fusion: FusionRanker::new(self.config.fusion.clone()),
            n_clusters: clusters.n_clusters(),
            config: self.config,
        })
    }
}

pub struct RecommendationEngine {
    table: FeatureTable,
    pipeline: FittedPipeline,
    similarity: SimilarityIndex,
    recall: RecallLayer,
    fusion: FusionRanker,
    n_clusters: usize,
    config: EngineConfig,
}

impl RecommendationEngine {
    /// Serve one recommendation request. Generation is best-effort per
    /// strategy, so this never fails: a degraded request yields fewer (or
    /// zero) tracks, not an error.
    pub fn recommend(&self, user: &UserData, context: &str, limit: usize) -> RecommendResponse {
        let limit = limit.max(1);

        info!(context, limit, "recommendation request");

        let ctx = RecallContext {
            table: &self.table,
            pipeline: &self.pipeline,
            user,
            context,
        };
        let mut rng = self.config.rng();

        // 1. Recall candidates from every strategy
        let (candidates, stats) = self.recall.recall_candidates(&ctx, limit, &mut rng);

        // 2. Fuse into one ranked list
        let ranked_rows = self.fusion.fuse(&candidates, limit);

        debug!(
            recalled = stats.total_candidates,
            returned = ranked_rows.len(),
            "request fused"
        );

        // 3. Format
        let tracks = ranked_rows
            .into_iter()
            .map(|row| self.format_track(row))
            .collect();

        RecommendResponse {
            tracks,
            insights: RecommendationInsights {
                total_tracks_processed: self.table.n_tracks(),
                features_used: self.table.n_features(),
                clusters_created: self.n_clusters,
                recommendation_engine: "hybrid".to_string(),
            },
        }
    }

    pub fn similarity_index(&self) -> &SimilarityIndex {
        &self.similarity
    }

    pub fn feature_table(&self) -> &FeatureTable {
        &self.table
    }

    pub fn pipeline(&self) -> &FittedPipeline {
        &self.pipeline
    }

    fn format_track(&self, row: usize) -> RecommendedTrack {
        let meta = self.table.meta(row);

        RecommendedTrack {
            id: row.to_string(),
            track_name: meta.name.clone(),
            artist_name: meta
                .artists
                .first()
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            album: meta.album.clone(),
            year: meta.year,
            explicit: meta.explicit,
            audio_features: self.table.features_of(row),
            cluster: meta.cluster,
            popularity_score: meta.popularity_score,
        }
    }
}
