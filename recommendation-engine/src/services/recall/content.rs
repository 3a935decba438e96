use super::{RecallContext, RecallStrategy};
use crate::error::Result;
use crate::models::RecallSource;
use crate::utils::{cosine_similarity, rank_descending};
use ndarray::Array1;
use rand::rngs::StdRng;
use std::collections::HashSet;
use tracing::debug;

/// Content-based recall
///
/// Averages the working-space vectors of the most recent listening-history
/// window and ranks the whole catalog by cosine similarity to that
/// centroid. Anything the user already has in the supplied history is
/// excluded.
pub struct ContentRecallStrategy;

/// History entries considered for the taste centroid.
const HISTORY_WINDOW: usize = 10;

impl RecallStrategy for ContentRecallStrategy {
    fn recall(
        &self,
        ctx: &RecallContext<'_>,
        limit: usize,
        _rng: &mut StdRng,
    ) -> Result<Vec<usize>> {
        let history = &ctx.user.listening_history;
        if history.is_empty() {
            return Ok(Vec::new());
        }

        let n_tracks = ctx.table.n_tracks();
        let window_start = history.len().saturating_sub(HISTORY_WINDOW);
        let window_rows: Vec<usize> = history[window_start..]
            .iter()
            .filter_map(|entry| entry.track_id.resolve(n_tracks))
            .collect();

        if window_rows.is_empty() {
            debug!("no history entry resolved to a catalog row, skipping content recall");
            return Ok(Vec::new());
        }

        let working = ctx.pipeline.working();
        let mut centroid = Array1::<f64>::zeros(working.ncols());
        for &row in &window_rows {
            centroid += &working.row(row);
        }
        centroid /= window_rows.len() as f64;

        let heard: HashSet<usize> = history
            .iter()
            .filter_map(|entry| entry.track_id.resolve(n_tracks))
            .collect();

        let scores: Vec<f64> = (0..n_tracks)
            .map(|row| cosine_similarity(centroid.view(), working.row(row)))
            .collect();

        Ok(rank_descending(&scores)
            .into_iter()
            .filter(|row| !heard.contains(row))
            .take(limit)
            .collect())
    }

    fn source(&self) -> RecallSource {
        RecallSource::Content
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::fixture_table;
    use super::*;
    use crate::models::UserData;
    use crate::services::preprocessing::FittedPipeline;
    use rand::SeedableRng;

    fn user_with_history(ids: &[usize]) -> UserData {
        let history: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| serde_json::json!({"trackId": id}))
            .collect();
        serde_json::from_value(serde_json::json!({ "listeningHistory": history })).unwrap()
    }

    fn catalog() -> crate::services::features::FeatureTable {
        fixture_table(&[
            &[("energy", 0.9), ("tempo", 150.0)],
            &[("energy", 0.8), ("tempo", 140.0)],
            &[("energy", 0.1), ("tempo", 60.0)],
            &[("energy", 0.2), ("tempo", 70.0)],
        ])
    }

    #[test]
    fn test_empty_history_yields_no_candidates() {
        let table = catalog();
        let pipeline = FittedPipeline::fit(&table).unwrap();
        let user = UserData::default();
        let ctx = RecallContext {
            table: &table,
            pipeline: &pipeline,
            user: &user,
            context: "general",
        };

        let mut rng = StdRng::seed_from_u64(0);
        let rows = ContentRecallStrategy.recall(&ctx, 5, &mut rng).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_history_rows_are_excluded() {
        let table = catalog();
        let pipeline = FittedPipeline::fit(&table).unwrap();
        let user = user_with_history(&[0]);
        let ctx = RecallContext {
            table: &table,
            pipeline: &pipeline,
            user: &user,
            context: "general",
        };

        let mut rng = StdRng::seed_from_u64(0);
        let rows = ContentRecallStrategy.recall(&ctx, 5, &mut rng).unwrap();

        assert!(!rows.is_empty());
        assert!(!rows.contains(&0));
        // Track 1 is nearly identical to the history track, so it ranks first.
        assert_eq!(rows[0], 1);
    }

    #[test]
    fn test_unresolvable_identities_are_skipped() {
        let table = catalog();
        let pipeline = FittedPipeline::fit(&table).unwrap();
        let user: UserData = serde_json::from_value(serde_json::json!({
            "listeningHistory": [
                {"trackId": "not-a-row"},
                {"trackId": 99},
                {"trackId": 2},
            ]
        }))
        .unwrap();
        let ctx = RecallContext {
            table: &table,
            pipeline: &pipeline,
            user: &user,
            context: "general",
        };

        let mut rng = StdRng::seed_from_u64(0);
        let rows = ContentRecallStrategy.recall(&ctx, 5, &mut rng).unwrap();

        assert!(!rows.contains(&2));
        // Track 3 sits next to track 2 in feature space.
        assert_eq!(rows[0], 3);
    }

    #[test]
    fn test_nothing_resolvable_yields_no_candidates() {
        let table = catalog();
        let pipeline = FittedPipeline::fit(&table).unwrap();
        let user: UserData = serde_json::from_value(serde_json::json!({
            "listeningHistory": [{"trackId": "bogus"}]
        }))
        .unwrap();
        let ctx = RecallContext {
            table: &table,
            pipeline: &pipeline,
            user: &user,
            context: "general",
        };

        let mut rng = StdRng::seed_from_u64(0);
        let rows = ContentRecallStrategy.recall(&ctx, 5, &mut rng).unwrap();
        assert!(rows.is_empty());
    }
}
