/// Recall layer: multi-strategy candidate generation
///
/// Four independent strategies propose track rows for a request. Candidate
/// generation is best-effort: a failing strategy is logged and degraded to
/// an empty list so the remaining strategies and fusion proceed normally.
mod collaborative;
mod content;
mod context;
mod popularity;

use crate::error::Result;
use crate::models::{Candidate, RecallSource, RecallStats, UserData};
use crate::services::features::FeatureTable;
use crate::services::preprocessing::FittedPipeline;
use rand::rngs::StdRng;
use tracing::{info, warn};

pub use collaborative::CollaborativeRecallStrategy;
pub use content::ContentRecallStrategy;
pub use context::ContextRecallStrategy;
pub use popularity::PopularityRecallStrategy;

/// Read-only engine state a strategy may consult for one request.
pub struct RecallContext<'a> {
    pub table: &'a FeatureTable,
    pub pipeline: &'a FittedPipeline,
    pub user: &'a UserData,
    pub context: &'a str,
}

pub trait RecallStrategy: Send + Sync {
    /// Track rows proposed by this strategy, best first, at most `limit`.
    fn recall(&self, ctx: &RecallContext<'_>, limit: usize, rng: &mut StdRng)
        -> Result<Vec<usize>>;

    fn source(&self) -> RecallSource;
}

pub struct RecallLayer {
    strategies: Vec<Box<dyn RecallStrategy>>,
}

impl Default for RecallLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecallLayer {
    pub fn new() -> Self {
        // Concatenation order is part of the fusion tie-break contract.
        let strategies: Vec<Box<dyn RecallStrategy>> = vec![
            Box::new(ContentRecallStrategy),
            Box::new(CollaborativeRecallStrategy),
            Box::new(ContextRecallStrategy),
            Box::new(PopularityRecallStrategy),
        ];

        Self { strategies }
    }

    /// Run every strategy and return the concatenated candidate multiset.
    /// Duplicates across strategies are kept: fusion accumulates weight per
    /// occurrence.
    pub fn recall_candidates(
        &self,
        ctx: &RecallContext<'_>,
        limit: usize,
        rng: &mut StdRng,
    ) -> (Vec<Candidate>, RecallStats) {
        let mut all_candidates = Vec::new();
        let mut stats = RecallStats::default();

        for strategy in &self.strategies {
            let source = strategy.source();
            match strategy.recall(ctx, limit, rng) {
                Ok(rows) => {
                    match source {
                        RecallSource::Content => stats.content_count = rows.len(),
                        RecallSource::Collaborative => stats.collaborative_count = rows.len(),
                        RecallSource::Context => stats.context_count = rows.len(),
                        RecallSource::Popularity => stats.popularity_count = rows.len(),
                    }
                    all_candidates.extend(
                        rows.into_iter()
                            .map(|track_row| Candidate { track_row, source }),
                    );
                }
                Err(e) => {
                    warn!("{} recall failed: {}", source.as_str(), e);
                }
            }
        }

        stats.total_candidates = all_candidates.len();

        info!(
            content = stats.content_count,
            collaborative = stats.collaborative_count,
            context = stats.context_count,
            popularity = stats.popularity_count,
            total = stats.total_candidates,
            "recall completed"
        );

        (all_candidates, stats)
    }
}
