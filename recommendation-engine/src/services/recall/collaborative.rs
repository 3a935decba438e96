use super::{RecallContext, RecallStrategy};
use crate::error::Result;
use crate::models::RecallSource;
use crate::utils::{cosine_similarity, rank_descending};
use ndarray::Array1;
use rand::rngs::StdRng;

/// Collaborative recall
///
/// Builds a preference vector over the canonical feature order, projects
/// it into the working space with the fitted pipeline, and ranks the whole
/// catalog by cosine similarity. History is not excluded here.
pub struct CollaborativeRecallStrategy;

/// Value assumed for features the user expressed no preference on.
const DEFAULT_PREFERENCE: f64 = 0.5;

impl RecallStrategy for CollaborativeRecallStrategy {
    fn recall(
        &self,
        ctx: &RecallContext<'_>,
        limit: usize,
        _rng: &mut StdRng,
    ) -> Result<Vec<usize>> {
        let preferences = match ctx.user.preferences.audio_features.as_ref() {
            Some(map) if !map.is_empty() => map,
            _ => return Ok(Vec::new()),
        };

        let raw: Array1<f64> = ctx
            .table
            .feature_names()
            .iter()
            .map(|name| {
                preferences
                    .get(name.as_str())
                    .copied()
                    .unwrap_or(DEFAULT_PREFERENCE)
            })
            .collect();

        let query = ctx.pipeline.project_vector(raw.view())?;

        let working = ctx.pipeline.working();
        let scores: Vec<f64> = (0..ctx.table.n_tracks())
            .map(|row| cosine_similarity(query.view(), working.row(row)))
            .collect();

        Ok(rank_descending(&scores).into_iter().take(limit).collect())
    }

    fn source(&self) -> RecallSource {
        RecallSource::Collaborative
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::fixture_table;
    use super::*;
    use crate::models::UserData;
    use crate::services::preprocessing::FittedPipeline;
    use rand::SeedableRng;

    fn user_with_preferences(prefs: &[(&str, f64)]) -> UserData {
        let map: std::collections::HashMap<String, f64> = prefs
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        serde_json::from_value(serde_json::json!({
            "preferences": {"audioFeatures": map}
        }))
        .unwrap()
    }

    #[test]
    fn test_no_preferences_yields_no_candidates() {
        let table = fixture_table(&[&[("energy", 0.9), ("tempo", 150.0)]]);
        let pipeline = FittedPipeline::fit(&table).unwrap();
        let ctx_user = UserData::default();
        let ctx = RecallContext {
            table: &table,
            pipeline: &pipeline,
            user: &ctx_user,
            context: "general",
        };

        let mut rng = StdRng::seed_from_u64(0);
        let rows = CollaborativeRecallStrategy
            .recall(&ctx, 5, &mut rng)
            .unwrap();
        assert!(rows.is_empty());

        // An empty map is treated the same as an absent one
        let empty_user = user_with_preferences(&[]);
        let ctx = RecallContext {
            table: &table,
            pipeline: &pipeline,
            user: &empty_user,
            context: "general",
        };
        let rows = CollaborativeRecallStrategy
            .recall(&ctx, 5, &mut rng)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_matching_preferences_rank_the_matching_track_first() {
        let table = fixture_table(&[
            &[("energy", 0.9), ("tempo", 150.0)],
            &[("energy", 0.1), ("tempo", 60.0)],
            &[("energy", 0.5), ("tempo", 100.0)],
        ]);
        let pipeline = FittedPipeline::fit(&table).unwrap();
        // Preferences identical to track 1's raw features project onto its
        // standardized vector exactly.
        let user = user_with_preferences(&[("energy", 0.1), ("tempo", 60.0)]);
        let ctx = RecallContext {
            table: &table,
            pipeline: &pipeline,
            user: &user,
            context: "general",
        };

        let mut rng = StdRng::seed_from_u64(0);
        let rows = CollaborativeRecallStrategy
            .recall(&ctx, 2, &mut rng)
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], 1);
    }

    #[test]
    fn test_missing_preference_values_default() {
        let table = fixture_table(&[
            &[("energy", 1.0), ("tempo", 200.0)],
            &[("energy", 0.0), ("tempo", 0.0)],
        ]);
        let pipeline = FittedPipeline::fit(&table).unwrap();
        // Only energy expressed; tempo falls back to 0.5
        let user = user_with_preferences(&[("energy", 1.0)]);
        let ctx = RecallContext {
            table: &table,
            pipeline: &pipeline,
            user: &user,
            context: "general",
        };

        let mut rng = StdRng::seed_from_u64(0);
        let rows = CollaborativeRecallStrategy
            .recall(&ctx, 2, &mut rng)
            .unwrap();

        assert_eq!(rows[0], 0);
    }
}
