use super::{RecallContext, RecallStrategy};
use crate::error::Result;
use crate::models::RecallSource;
use rand::rngs::StdRng;
use tracing::debug;

/// Context-aware recall
///
/// Filters the catalog with inclusive per-feature ranges for a named
/// listening context and draws a uniform random sample from the matches.
/// The `general` context (and anything unknown) contributes no candidates.
pub struct ContextRecallStrategy;

/// Context name -> (feature, min, max) predicates, applied conjunctively
/// over raw feature values. Predicates on unrecognized features are skipped.
const CONTEXT_FILTERS: &[(&str, &[(&str, f64, f64)])] = &[
    ("workout", &[("energy", 0.7, 1.0), ("tempo", 120.0, 200.0)]),
    ("chill", &[("energy", 0.0, 0.5), ("valence", 0.3, 0.8)]),
    ("party", &[("danceability", 0.7, 1.0), ("energy", 0.7, 1.0)]),
    (
        "focus",
        &[("instrumentalness", 0.5, 1.0), ("speechiness", 0.0, 0.3)],
    ),
    ("sleep", &[("energy", 0.0, 0.3), ("tempo", 60.0, 100.0)]),
];

fn filters_for(context: &str) -> Option<&'static [(&'static str, f64, f64)]> {
    CONTEXT_FILTERS
        .iter()
        .find(|(name, _)| *name == context)
        .map(|(_, filters)| *filters)
}

impl RecallStrategy for ContextRecallStrategy {
    fn recall(
        &self,
        ctx: &RecallContext<'_>,
        limit: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<usize>> {
        let filters = match filters_for(ctx.context) {
            Some(filters) => filters,
            None => return Ok(Vec::new()),
        };

        // Resolve predicate columns once; skip features the catalog does
        // not recognize.
        let predicates: Vec<(usize, f64, f64)> = filters
            .iter()
            .filter_map(|(name, min, max)| {
                ctx.table.feature_index(name).map(|col| (col, *min, *max))
            })
            .collect();

        let matrix = ctx.table.matrix();
        let filtered: Vec<usize> = (0..ctx.table.n_tracks())
            .filter(|&row| {
                predicates.iter().all(|&(col, min, max)| {
                    let value = matrix[[row, col]];
                    value >= min && value <= max
                })
            })
            .collect();

        if filtered.is_empty() {
            debug!(context = ctx.context, "no tracks match the context filter");
            return Ok(Vec::new());
        }

        let draw = limit.min(filtered.len());
        let picked = rand::seq::index::sample(rng, filtered.len(), draw)
            .into_iter()
            .map(|i| filtered[i])
            .collect();

        Ok(picked)
    }

    fn source(&self) -> RecallSource {
        RecallSource::Context
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::fixture_table;
    use super::*;
    use crate::models::UserData;
    use crate::services::preprocessing::FittedPipeline;
    use rand::SeedableRng;

    fn recall_in(context: &str, limit: usize, seed: u64) -> Vec<usize> {
        let table = fixture_table(&[
            &[("danceability", 0.9), ("energy", 0.9), ("tempo", 150.0)],
            &[("danceability", 0.1), ("energy", 0.1), ("tempo", 70.0)],
            &[("danceability", 0.5), ("energy", 0.5), ("tempo", 100.0)],
            &[("danceability", 0.8), ("energy", 0.75), ("tempo", 125.0)],
        ]);
        let pipeline = FittedPipeline::fit(&table).unwrap();
        let user = UserData::default();
        let ctx = RecallContext {
            table: &table,
            pipeline: &pipeline,
            user: &user,
            context,
        };

        let mut rng = StdRng::seed_from_u64(seed);
        ContextRecallStrategy.recall(&ctx, limit, &mut rng).unwrap()
    }

    #[test]
    fn test_general_context_contributes_nothing() {
        assert!(recall_in("general", 10, 0).is_empty());
    }

    #[test]
    fn test_unknown_context_contributes_nothing() {
        assert!(recall_in("underwater", 10, 0).is_empty());
    }

    #[test]
    fn test_workout_filter_bounds() {
        let rows = recall_in("workout", 10, 0);

        // Tracks 0 and 3 satisfy energy >= 0.7 and 120 <= tempo <= 200
        let mut sorted = rows.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 3]);
    }

    #[test]
    fn test_draw_respects_limit() {
        let rows = recall_in("workout", 1, 0);
        assert_eq!(rows.len(), 1);
        assert!(rows[0] == 0 || rows[0] == 3);
    }

    #[test]
    fn test_draw_is_seeded() {
        assert_eq!(recall_in("workout", 1, 11), recall_in("workout", 1, 11));
    }

    #[test]
    fn test_predicates_on_unrecognized_features_are_skipped() {
        // Catalog has no instrumentalness/speechiness: every predicate of
        // "focus" drops out and the whole catalog qualifies.
        let table = fixture_table(&[
            &[("energy", 0.9)],
            &[("energy", 0.1)],
        ]);
        let pipeline = FittedPipeline::fit(&table).unwrap();
        let user = UserData::default();
        let ctx = RecallContext {
            table: &table,
            pipeline: &pipeline,
            user: &user,
            context: "focus",
        };

        let mut rng = StdRng::seed_from_u64(0);
        let rows = ContextRecallStrategy.recall(&ctx, 10, &mut rng).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
