use crate::models::RecallSource;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub similarity: SimilarityConfig,
    pub fusion: FusionWeights,
    /// Seed for the sampling RNG (similarity index + context draw).
    /// None means a fresh entropy seed per run.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    /// Catalogs larger than this are sampled before the pairwise matrix is built.
    pub sample_size: usize,
}

/// Per-source weights for hybrid fusion. Sources without an explicit
/// weight (context) fall back to `fallback`.
#[derive(Debug, Clone)]
pub struct FusionWeights {
    pub content: f64,
    pub collaborative: f64,
    pub popularity: f64,
    pub fallback: f64,
}

impl FusionWeights {
    pub fn weight_for(&self, source: RecallSource) -> f64 {
        match source {
            RecallSource::Content => self.content,
            RecallSource::Collaborative => self.collaborative,
            RecallSource::Popularity => self.popularity,
            RecallSource::Context => self.fallback,
        }
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            content: 0.6,
            collaborative: 0.3,
            popularity: 0.1,
            fallback: 0.1,
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            sample_size: 50_000,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity: SimilarityConfig::default(),
            fusion: FusionWeights::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        EngineConfig {
            similarity: SimilarityConfig {
                sample_size: env::var("SIMILARITY_SAMPLE_SIZE")
                    .unwrap_or_else(|_| "50000".to_string())
                    .parse()
                    .expect("SIMILARITY_SAMPLE_SIZE must be a valid usize"),
            },
            fusion: FusionWeights {
                content: env::var("CONTENT_WEIGHT")
                    .unwrap_or_else(|_| "0.6".to_string())
                    .parse()
                    .expect("CONTENT_WEIGHT must be a valid f64"),
                collaborative: env::var("COLLABORATIVE_WEIGHT")
                    .unwrap_or_else(|_| "0.3".to_string())
                    .parse()
                    .expect("COLLABORATIVE_WEIGHT must be a valid f64"),
                popularity: env::var("POPULARITY_WEIGHT")
                    .unwrap_or_else(|_| "0.1".to_string())
                    .parse()
                    .expect("POPULARITY_WEIGHT must be a valid f64"),
                fallback: env::var("FALLBACK_WEIGHT")
                    .unwrap_or_else(|_| "0.1".to_string())
                    .parse()
                    .expect("FALLBACK_WEIGHT must be a valid f64"),
            },
            seed: env::var("RANDOM_SEED")
                .ok()
                .map(|v| v.parse().expect("RANDOM_SEED must be a valid u64")),
        }
    }

    /// RNG for sampling steps. Seeded when `seed` is set so that
    /// similarity sampling and the context draw are reproducible.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
