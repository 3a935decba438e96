/// Similarity Index
///
/// Symmetric pairwise cosine matrix over the working feature vectors of a
/// (possibly sampled) subset of the catalog, with the sample-row to
/// track-row mapping. Immutable once built.
use crate::error::{EngineError, Result};
use crate::utils::cosine_similarity;
use ndarray::{Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use tracing::info;

pub struct SimilarityIndex {
    /// Pairwise cosine similarity over the sampled rows.
    matrix: Array2<f64>,
    /// Sample row -> original track row.
    sample_rows: Vec<usize>,
    /// Working vectors of the sampled rows, kept for query ranking.
    features: Array2<f64>,
}

impl SimilarityIndex {
    /// Build the index over `working`. Catalogs larger than `sample_size`
    /// are sampled uniformly without replacement with the supplied RNG.
    pub fn build(working: &Array2<f64>, sample_size: usize, rng: &mut StdRng) -> Result<Self> {
        let rows = working.nrows();
        if rows == 0 {
            return Err(EngineError::Build(
                "working feature matrix is empty".to_string(),
            ));
        }

        let sample_rows: Vec<usize> = if rows > sample_size {
            rand::seq::index::sample(rng, rows, sample_size).into_vec()
        } else {
            (0..rows).collect()
        };

        let features = working.select(Axis(0), &sample_rows);

        let n = sample_rows.len();
        let mut matrix = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let similarity = cosine_similarity(features.row(i), features.row(j));
                matrix[[i, j]] = similarity;
                matrix[[j, i]] = similarity;
            }
        }

        info!(
            sampled = n,
            total = rows,
            "similarity index built"
        );

        Ok(SimilarityIndex {
            matrix,
            sample_rows,
            features,
        })
    }

    pub fn len(&self) -> usize {
        self.sample_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_rows.is_empty()
    }

    /// Original track row for a sample row.
    pub fn track_for_sample(&self, sample_row: usize) -> usize {
        self.sample_rows[sample_row]
    }

    /// Pairwise similarity between two sample rows.
    pub fn similarity(&self, a: usize, b: usize) -> f64 {
        self.matrix[[a, b]]
    }

    /// Sample rows ordered by descending similarity to a query vector in
    /// the working space.
    pub fn rank_rows(&self, query: ArrayView1<f64>) -> Result<Vec<usize>> {
        if query.len() != self.features.ncols() {
            return Err(EngineError::Generation(format!(
                "query vector has {} dimensions, index was built with {}",
                query.len(),
                self.features.ncols()
            )));
        }

        let scores: Vec<f64> = (0..self.len())
            .map(|i| cosine_similarity(query, self.features.row(i)))
            .collect();
        Ok(crate::utils::rank_descending(&scores))
    }
}
