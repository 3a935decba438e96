use super::{RecallContext, RecallStrategy};
use crate::error::Result;
use crate::models::RecallSource;
use crate::utils::rank_descending;
use rand::rngs::StdRng;

/// Popularity recall
///
/// Top tracks by popularity score. Catalogs with no popularity signal at
/// all fall back to a uniform random draw.
pub struct PopularityRecallStrategy;

/// The random fallback draws this many times the limit before truncating.
const OVERSAMPLE_FACTOR: usize = 2;

impl RecallStrategy for PopularityRecallStrategy {
    fn recall(
        &self,
        ctx: &RecallContext<'_>,
        limit: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<usize>> {
        let n_tracks = ctx.table.n_tracks();

        match ctx.table.popularity() {
            Some(scores) => Ok(rank_descending(scores).into_iter().take(limit).collect()),
            None => {
                let draw = limit.saturating_mul(OVERSAMPLE_FACTOR).min(n_tracks);
                let mut picked: Vec<usize> =
                    rand::seq::index::sample(rng, n_tracks, draw).into_vec();
                picked.truncate(limit);
                Ok(picked)
            }
        }
    }

    fn source(&self) -> RecallSource {
        RecallSource::Popularity
    }
}
